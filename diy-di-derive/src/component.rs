use crate::attributes::ComponentAttributes;
use proc_macro2::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Error, FnArg, ItemTrait, Result, ReturnType, TraitItem};

fn validate_entry_points(item: &ItemTrait) -> Result<()> {
    for trait_item in &item.items {
        let TraitItem::Fn(function) = trait_item else {
            return Err(Error::new(
                trait_item.span(),
                "Components can only declare entry point functions!",
            ));
        };

        let inputs = &function.sig.inputs;
        let takes_ref_self = inputs.len() == 1
            && matches!(
                inputs.first(),
                Some(FnArg::Receiver(receiver)) if receiver.reference.is_some() && receiver.mutability.is_none()
            );

        if !takes_ref_self || matches!(function.sig.output, ReturnType::Default) {
            return Err(Error::new(
                function.sig.span(),
                format!(
                    "Entry point '{}' should take only '&self' and return the requested instance!",
                    function.sig.ident
                ),
            ));
        }
    }

    Ok(())
}

pub fn expand_component(item: &ItemTrait, attributes: &ComponentAttributes) -> Result<TokenStream> {
    if !item.generics.params.is_empty() {
        return Err(Error::new(
            item.generics.span(),
            "Components cannot be generic!",
        ));
    }

    validate_entry_points(item)?;

    let modules = &attributes.modules;

    Ok(quote! {
        #item

        const _: () = {
            #[allow(dead_code)]
            fn assert_binds<B: diy_di::module::Binds>() {}

            #[allow(dead_code)]
            fn assert_modules() {
                #(assert_binds::<#modules>();)*
            }
        };
    })
}
