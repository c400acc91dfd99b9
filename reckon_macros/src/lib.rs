use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, FnArg, ItemFn, PatType, Type};

fn formatted_arg_error_msg(arg_name: &str, arg_pos: usize, fn_name: &str) -> String {
    format!(
        "argument {} ('{}') of builtin '{}' must be f64",
        arg_pos, arg_name, fn_name
    )
}

/// Turns `fn name(a: f64, b: f64) -> f64 { .. }` into a native builtin
/// `fn name(args: &[f64]) -> Result<f64, EngineError>` plus a `NAME_ARITY`
/// constant. `EngineError` must be in scope at the call site.
#[proc_macro_attribute]
pub fn reckon_fn(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    let fn_name = &input.sig.ident;
    let fn_args = &input.sig.inputs;
    let fn_body = &input.block;
    let vis = &input.vis;
    let attrs = &input.attrs;

    let mut arg_extractions = Vec::new();

    for (i, arg) in fn_args.iter().enumerate() {
        let FnArg::Typed(PatType { pat, ty, .. }) = arg else {
            return syn::Error::new_spanned(arg, "builtins cannot take self")
                .to_compile_error()
                .into();
        };

        let arg_name = match **pat {
            syn::Pat::Ident(ref ident) => &ident.ident,
            _ => {
                return syn::Error::new_spanned(pat, "unsupported argument pattern")
                    .to_compile_error()
                    .into()
            }
        };

        let is_f64 = matches!(
            **ty,
            Type::Path(ref type_path) if type_path.path.is_ident("f64")
        );
        if !is_f64 {
            let err_msg = formatted_arg_error_msg(&arg_name.to_string(), i, &fn_name.to_string());
            return syn::Error::new_spanned(ty, err_msg).to_compile_error().into();
        }

        arg_extractions.push(quote! {
            let #arg_name: f64 = args[#i];
        });
    }

    let args_len = arg_extractions.len();
    let arity_ident = format_ident!("{}_ARITY", fn_name.to_string().to_uppercase());
    let name_str = fn_name.to_string();

    let expanded = quote! {
        #[doc = concat!("Number of arguments taken by `", #name_str, "`.")]
        #vis const #arity_ident: usize = #args_len;

        #(#attrs)*
        #vis fn #fn_name(args: &[f64]) -> Result<f64, EngineError> {
            if args.len() != #args_len {
                return Err(EngineError::ArityMismatch {
                    name: #name_str.to_string(),
                    expected: #args_len,
                    found: args.len(),
                });
            }

            #(#arg_extractions)*

            let result: f64 = #fn_body;
            Ok(result)
        }
    };

    TokenStream::from(expanded)
}
