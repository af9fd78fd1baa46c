use crate::attributes::{DefaultDefinition, FieldAttributes, InjectableAttributes, INJECT};
use itertools::Itertools;
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote, ToTokens};
use syn::spanned::Spanned;
use syn::{
    Attribute, Data, DataStruct, DeriveInput, Error, Field, Fields, FnArg, ImplItem, ImplItemFn,
    ItemImpl, Result, Type,
};

/// How a single field gets its value - either from the next constructor parameter, or from its
/// default initializer.
enum FieldSource {
    Parameter(Ident, Type),
    Default(TokenStream),
}

fn field_source(field: &Field, index: usize) -> Result<FieldSource> {
    for attr in &field.attrs {
        if attr.path().is_ident(INJECT) {
            match FieldAttributes::try_from(attr)?.default {
                Some(DefaultDefinition::Expr(path)) => {
                    return Ok(FieldSource::Default(quote!(#path())))
                }
                Some(DefaultDefinition::Default) => {
                    return Ok(FieldSource::Default(quote!(std::default::Default::default())))
                }
                None => {}
            }
        }
    }

    Ok(FieldSource::Parameter(
        format_ident!("parameter_{}", index),
        field.ty.clone(),
    ))
}

fn extract_injectable_attributes(attributes: &[Attribute]) -> Result<InjectableAttributes> {
    attributes
        .iter()
        .filter(|attribute| attribute.path().is_ident(INJECT))
        .map(InjectableAttributes::try_from)
        .next()
        .transpose()
        .map(Option::unwrap_or_default)
}

fn generate_inject(
    ty: &TokenStream,
    parameters: &[(Ident, Type)],
    is_singleton: bool,
    construction: TokenStream,
) -> TokenStream {
    let names = parameters.iter().map(|(name, _)| name);
    let types = parameters.iter().map(|(_, ty)| ty);

    quote! {
        #[automatically_derived]
        impl diy_di::inject::Inject for #ty {
            type Parameters = (#(#types,)*);

            const SINGLETON: bool = #is_singleton;

            #[allow(unused_variables)]
            fn inject((#(#names,)*): Self::Parameters) -> Self {
                #construction
            }
        }

        diy_di::register_injectable!(#ty);
    }
}

pub fn expand_injectable(input: &DeriveInput) -> Result<TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(Error::new(
            input.generics.span(),
            "Injectable types cannot be generic!",
        ));
    }

    let Data::Struct(DataStruct { fields, .. }) = &input.data else {
        return Err(Error::new(
            input.span(),
            "Can only derive Injectable on structs!",
        ));
    };

    let attributes = extract_injectable_attributes(&input.attrs)?;
    let sources: Vec<_> = fields
        .iter()
        .enumerate()
        .map(|(index, field)| field_source(field, index))
        .try_collect()?;

    let values = sources.iter().map(|source| match source {
        FieldSource::Parameter(name, _) => quote!(#name),
        FieldSource::Default(initializer) => initializer.clone(),
    });

    let construction = match fields {
        Fields::Named(fields) => {
            let idents = fields.named.iter().map(|field| &field.ident);
            quote! {
                Self {
                    #(#idents: #values),*
                }
            }
        }
        Fields::Unnamed(_) => quote! {
            Self(#(#values),*)
        },
        Fields::Unit => quote! { Self },
    };

    let parameters = sources
        .into_iter()
        .filter_map(|source| match source {
            FieldSource::Parameter(name, ty) => Some((name, ty)),
            FieldSource::Default(_) => None,
        })
        .collect_vec();

    Ok(generate_inject(
        &input.ident.to_token_stream(),
        &parameters,
        attributes.is_singleton,
        construction,
    ))
}

fn is_constructor(function: &ImplItemFn) -> bool {
    function
        .attrs
        .iter()
        .any(|attribute| attribute.path().is_ident(INJECT))
}

pub fn expand_injectable_impl(
    mut item: ItemImpl,
    attributes: &InjectableAttributes,
) -> Result<TokenStream> {
    if item.trait_.is_some() {
        return Err(Error::new(
            item.span(),
            "Injectable constructors can only be declared in inherent impl blocks!",
        ));
    }

    if !item.generics.params.is_empty() {
        return Err(Error::new(
            item.generics.span(),
            "Injectable types cannot be generic!",
        ));
    }

    let ty = item.self_ty.to_token_stream();
    let type_name = ty.to_string().replace(' ', "");

    let constructors = item
        .items
        .iter()
        .filter_map(|item| match item {
            ImplItem::Fn(function) if is_constructor(function) => Some(function),
            _ => None,
        })
        .collect_vec();

    let constructor = match constructors.as_slice() {
        [constructor] => *constructor,
        [] => {
            return Err(Error::new(
                item.self_ty.span(),
                format!("Type '{type_name}' has no constructor marked as injectable."),
            ))
        }
        [_, duplicate, ..] => {
            return Err(Error::new(
                duplicate.sig.span(),
                format!(
                    "Type '{type_name}' has {} constructors marked as injectable, but at most one is allowed.",
                    constructors.len()
                ),
            ))
        }
    };

    let function = &constructor.sig.ident;
    let parameters: Vec<_> = constructor
        .sig
        .inputs
        .iter()
        .enumerate()
        .map(|(index, input)| match input {
            FnArg::Typed(argument) => Ok((
                format_ident!("parameter_{}", index),
                (*argument.ty).clone(),
            )),
            FnArg::Receiver(receiver) => Err(Error::new(
                receiver.span(),
                "Injectable constructors cannot take self!",
            )),
        })
        .try_collect()?;

    let names = parameters.iter().map(|(name, _)| name);
    let construction = quote! {
        Self::#function(#(#names),*)
    };

    let inject = generate_inject(&ty, &parameters, attributes.is_singleton, construction);

    for item in &mut item.items {
        if let ImplItem::Fn(function) = item {
            function
                .attrs
                .retain(|attribute| !attribute.path().is_ident(INJECT));
        }
    }

    Ok(quote! {
        #item

        #inject
    })
}
