use quote::{format_ident, quote};

/// One `#[test]` per `.gimme` script under `bin/tests/scripts`, named after its path.
#[proc_macro]
pub fn generate_tests(_: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let root_dir = format!("{}/../scripts", env!("CARGO_MANIFEST_DIR"));
    let tests = walkdir::WalkDir::new(&root_dir)
        .sort_by_file_name()
        .into_iter()
        .flatten()
        .filter(|entry| entry.path().extension() == Some("gimme".as_ref()))
        .map(|entry| {
            let script_path = entry.path().to_string_lossy().to_string();
            let name = entry
                .path()
                .strip_prefix(&root_dir)
                .unwrap_or(entry.path())
                .with_extension("")
                .to_string_lossy()
                .replace(['/', '-', '.'], "_");
            let test_ident = format_ident!("script_{}", name);
            quote! {
                #[test]
                fn #test_ident() {
                    gimme_expect(std::fs::read_to_string(#script_path).unwrap().as_str());
                }
            }
        });

    quote! {
        #[ctor::ctor]
        fn init() {
            let _ = env_logger::builder().is_test(true).try_init();
        }

        #(#tests)*
    }
    .into()
}
