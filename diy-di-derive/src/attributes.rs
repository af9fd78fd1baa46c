use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{parenthesized, Attribute, Error, ExprPath, LitStr, Path, Token};

pub const INJECT: &str = "inject";

pub enum DefaultDefinition {
    Default,
    Expr(ExprPath),
}

pub struct FieldAttributes {
    pub default: Option<DefaultDefinition>,
}

impl TryFrom<&Attribute> for FieldAttributes {
    type Error = Error;

    fn try_from(value: &Attribute) -> Result<Self, Self::Error> {
        let mut default = None;
        value.parse_nested_meta(|meta| {
            if meta.path.is_ident("default") {
                if meta.input.peek(Token![=]) {
                    let value = meta.value()?;
                    let expr: LitStr = value.parse()?;
                    default = Some(DefaultDefinition::Expr(expr.parse()?));
                } else {
                    default = Some(DefaultDefinition::Default);
                }

                Ok(())
            } else {
                Err(meta.error("Unsupported field configuration!"))
            }
        })?;

        Ok(Self { default })
    }
}

/// Struct-level `#[inject(...)]` configuration.
#[derive(Default)]
pub struct InjectableAttributes {
    pub is_singleton: bool,
}

impl TryFrom<&Attribute> for InjectableAttributes {
    type Error = Error;

    fn try_from(value: &Attribute) -> Result<Self, Self::Error> {
        value.parse_args()
    }
}

impl Parse for InjectableAttributes {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut result = Self::default();
        while !input.is_empty() {
            let lookahead = input.lookahead1();
            if lookahead.peek(kw::singleton) {
                if result.is_singleton {
                    return Err(Error::new(input.span(), "Singleton is already defined!"));
                }

                let _ = input.parse::<kw::singleton>()?;
                result.is_singleton = true;
            } else if lookahead.peek(Token![,]) {
                let _ = input.parse::<Token![,]>()?;
            } else {
                return Err(lookahead.error());
            }
        }

        Ok(result)
    }
}

/// `#[component(...)]` configuration.
#[derive(Default)]
pub struct ComponentAttributes {
    pub modules: Vec<Path>,
}

impl Parse for ComponentAttributes {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut result = Self::default();
        while !input.is_empty() {
            let lookahead = input.lookahead1();
            if lookahead.peek(kw::modules) {
                if !result.modules.is_empty() {
                    return Err(Error::new(input.span(), "Modules are already defined!"));
                }

                let _ = input.parse::<kw::modules>()?;
                let content;
                parenthesized!(content in input);
                result.modules = Punctuated::<Path, Token![,]>::parse_terminated(&content)?
                    .into_iter()
                    .collect();
            } else if lookahead.peek(Token![,]) {
                let _ = input.parse::<Token![,]>()?;
            } else {
                return Err(lookahead.error());
            }
        }

        Ok(result)
    }
}

mod kw {
    use syn::custom_keyword;

    custom_keyword!(singleton);
    custom_keyword!(modules);
}
