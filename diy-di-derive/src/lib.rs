use crate::attributes::{ComponentAttributes, InjectableAttributes};
use crate::binds::expand_binds;
use crate::component::expand_component;
use crate::injectable::{expand_injectable, expand_injectable_impl};
use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput, Error, ItemImpl, ItemTrait};

mod attributes;
mod binds;
mod component;
mod injectable;

#[proc_macro_derive(Injectable, attributes(inject))]
pub fn generate_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_injectable(&input)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

#[proc_macro_attribute]
pub fn injectable(args: TokenStream, input: TokenStream) -> TokenStream {
    let args = parse_macro_input!(args as InjectableAttributes);
    let item = parse_macro_input!(input as ItemImpl);
    expand_injectable_impl(item, &args)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

#[proc_macro_attribute]
pub fn binds(_args: TokenStream, input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as ItemImpl);
    expand_binds(&item)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

#[proc_macro_attribute]
pub fn component(args: TokenStream, input: TokenStream) -> TokenStream {
    let args = parse_macro_input!(args as ComponentAttributes);
    let item = parse_macro_input!(input as ItemTrait);
    expand_component(&item, &args)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}
