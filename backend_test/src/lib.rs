use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, FnArg, ItemFn, Pat, Signature, Type};

/// Transform an asynchronous test into a synchronous one and inject dependencies.
///
/// Injectable dependencies are [`rocket::local::asynchronous::Client`] (over an in-memory
/// ledger), `TestStore`, `TestClock` and `Ledger`, all sharing the same store and clock.
/// Other attributes on the test, such as `#[ignore]`, are kept.
#[proc_macro_attribute]
pub fn backend_test(_args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);

    // Extract type information and reject invalid function signatures.
    let test_args = match check_sig(item_fn.sig.clone()) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Rename the future so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_fut", name);
    item_fn.sig.ident = new_name.clone();

    // Attributes belong on the generated test, not the inner future.
    let attrs = std::mem::take(&mut item_fn.attrs);

    quote! {
        #[test]
        #(#attrs)*
        fn #name() {
            /// The test itself.
            #item_fn

            let runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("rocket-worker-test-thread")
                .worker_threads(2)
                .enable_all()
                .build()
                .unwrap();

            runtime.block_on(async {
                #[allow(unused_variables)]
                let (rocket_client, store, clock) = crate::testing::setup().await;
                #[allow(unused_variables)]
                let ledger = rocket_client
                    .rocket()
                    .state::<crate::ledger::Ledger>()
                    .unwrap()
                    .clone();

                #new_name(#(#test_args),*).await;
            });
        }
    }
    .into()
}

/// Ensure the wrapped test is async, extract parameters to inject, and reject unknown parameters.
fn check_sig(sig: Signature) -> Result<Vec<TokenStream2>, syn::Error> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(sig.span(), "Test must be marked `async`"));
    }

    let mut seen = vec![];
    let mut args = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let (Pat::Ident(_), Type::Path(type_path)) = (&*pat_type.pat, &*pat_type.ty) {
                if let Some(type_ident) = type_path.path.get_ident() {
                    let injected = match type_ident.to_string().as_str() {
                        "Client" => Some(quote! { rocket_client }),
                        "TestStore" => Some(quote! { store.clone() }),
                        "TestClock" => Some(quote! { clock.clone() }),
                        "Ledger" => Some(quote! { ledger.clone() }),
                        _ => None,
                    };
                    if let Some(injected) = injected {
                        if seen.contains(type_ident) {
                            return Err(syn::Error::new(
                                input.span(),
                                format!("Test cannot accept more than one `{type_ident}`"),
                            ));
                        }
                        seen.push(type_ident.clone());
                        args.push(injected);
                        continue;
                    }
                }
            }
        }

        return Err(syn::Error::new(
            input.span(),
            "Expected parameters of type `Client`, `TestStore`, `TestClock` or `Ledger`",
        ));
    }

    Ok(args)
}
