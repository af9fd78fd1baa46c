use itertools::Itertools;
use proc_macro2::TokenStream;
use quote::{quote, ToTokens};
use syn::spanned::Spanned;
use syn::{Error, FnArg, ImplItem, ItemImpl, Result};

pub fn expand_binds(item: &ItemImpl) -> Result<TokenStream> {
    if item.trait_.is_some() {
        return Err(Error::new(
            item.span(),
            "Bind functions can only be declared in inherent impl blocks!",
        ));
    }

    if !item.generics.params.is_empty() {
        return Err(Error::new(
            item.generics.span(),
            "Bind modules cannot be generic!",
        ));
    }

    let ty = &item.self_ty;
    let module_name = ty.to_token_stream().to_string().replace(' ', "");

    let functions: Vec<_> = item
        .items
        .iter()
        .filter_map(|item| match item {
            ImplItem::Fn(function) => Some(function),
            _ => None,
        })
        .map(|function| {
            let inputs = &function.sig.inputs;
            let is_valid = inputs.len() == 1
                && inputs
                    .iter()
                    .all(|input| matches!(input, FnArg::Typed(_)));

            if is_valid {
                Ok(&function.sig.ident)
            } else {
                Err(Error::new(
                    function.sig.span(),
                    format!(
                        "Bind function '{}' in module '{module_name}' should have exactly one parameter, but has {}.",
                        function.sig.ident,
                        inputs.len()
                    ),
                ))
            }
        })
        .try_collect()?;

    Ok(quote! {
        #item

        #[automatically_derived]
        impl diy_di::module::Binds for #ty {
            fn install(module: &mut diy_di::module::BindingModule) {
                #(module.bind(Self::#functions);)*
            }
        }
    })
}
