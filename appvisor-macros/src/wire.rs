use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote, quote_spanned};
use syn::{
    Attribute, Data, DeriveInput, Error, Fields, Ident, Index, LitStr, Meta, Result, Token,
    parse::{Parse, ParseStream},
    spanned::Spanned,
};

/// Marker found on a single field.
enum Marker {
    Resolve { name: LitStr },
    Config { key: LitStr, default: Option<LitStr> },
}

/// Arguments of a marker attribute: at most one positional string, then `key = "value"` pairs.
struct MarkerArgs {
    positional: Option<LitStr>,
    named: Vec<(Ident, LitStr)>,
}

impl Parse for MarkerArgs {
    fn parse(input: ParseStream<'_>) -> Result<Self> {
        let mut args = MarkerArgs {
            positional: None,
            named: Vec::new(),
        };
        while !input.is_empty() {
            if input.peek(LitStr) {
                let lit: LitStr = input.parse()?;
                if args.positional.is_some() || !args.named.is_empty() {
                    return Err(Error::new(
                        lit.span(),
                        "the unnamed string must come first and only once",
                    ));
                }
                args.positional = Some(lit);
            } else {
                let key: Ident = input.parse()?;
                input.parse::<Token![=]>()?;
                let value: LitStr = input.parse()?;
                args.named.push((key, value));
            }
            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }
        Ok(args)
    }
}

impl MarkerArgs {
    fn from_attr(attr: &Attribute) -> Result<Self> {
        match &attr.meta {
            Meta::Path(_) => Ok(MarkerArgs {
                positional: None,
                named: Vec::new(),
            }),
            _ => attr.parse_args_with(MarkerArgs::parse),
        }
    }

    fn take(&mut self, key: &str) -> Option<LitStr> {
        let pos = self.named.iter().position(|(k, _)| k == key)?;
        Some(self.named.remove(pos).1)
    }

    fn reject_rest(self, marker: &str) -> Result<()> {
        match self.named.into_iter().next() {
            Some((key, _)) => Err(Error::new(
                key.span(),
                format!("unknown `{marker}` argument: {key}"),
            )),
            None => Ok(()),
        }
    }
}

fn parse_marker(attrs: &[Attribute], field_span: Span) -> Result<Option<Marker>> {
    let mut found: Option<Marker> = None;

    for attr in attrs {
        let marker = if attr.path().is_ident("resolve") {
            let mut args = MarkerArgs::from_attr(attr)?;
            let named = args.take("name");
            let name = match (args.positional.take(), named) {
                (Some(_), Some(dup)) => {
                    return Err(Error::new(dup.span(), "binding name given twice"));
                }
                (Some(name), None) | (None, Some(name)) => name,
                (None, None) => LitStr::new("", attr.span()),
            };
            args.reject_rest("resolve")?;
            Marker::Resolve { name }
        } else if attr.path().is_ident("config") {
            let mut args = MarkerArgs::from_attr(attr)?;
            let named = args.take("key");
            let key = match (args.positional.take(), named) {
                (Some(_), Some(dup)) => {
                    return Err(Error::new(dup.span(), "config key given twice"));
                }
                (Some(key), None) | (None, Some(key)) => key,
                (None, None) => {
                    return Err(Error::new(
                        attr.span(),
                        "missing config key, e.g. #[config(\"POLL_INTERVAL\", default = \"2s\")]",
                    ));
                }
            };
            if key.value().is_empty() {
                return Err(Error::new(key.span(), "config key must not be empty"));
            }
            let default = args.take("default");
            args.reject_rest("config")?;
            Marker::Config { key, default }
        } else {
            continue;
        };

        if found.is_some() {
            return Err(Error::new(
                field_span,
                "a field carries at most one of #[resolve] / #[config]",
            ));
        }
        found = Some(marker);
    }

    Ok(found)
}

pub(crate) fn expand(input: DeriveInput) -> Result<TokenStream> {
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        _ => {
            return Err(Error::new(
                Span::call_site(),
                "#[derive(Wire)] only supports structs",
            ));
        }
    };

    let mut computes = Vec::new();
    let mut assigns = Vec::new();

    let iter: Vec<_> = match fields {
        Fields::Named(named) => named.named.iter().collect(),
        Fields::Unnamed(unnamed) => unnamed.unnamed.iter().collect(),
        Fields::Unit => Vec::new(),
    };

    for (idx, field) in iter.into_iter().enumerate() {
        let span = field.span();
        let Some(marker) = parse_marker(&field.attrs, span)? else {
            continue;
        };

        let ty = &field.ty;
        let local = format_ident!("__appvisor_wired_{}", idx);
        let member = match &field.ident {
            Some(name) => quote!(#name),
            None => {
                let index = Index::from(idx);
                quote!(#index)
            }
        };

        // Spanned on the field so the captured caller points at the declaration.
        let compute = match marker {
            Marker::Resolve { name } => quote_spanned! {span=>
                let #local: #ty = wirer.dependency(#name)?;
            },
            Marker::Config { key, default } => {
                let default = match default {
                    Some(lit) => quote!(::core::option::Option::Some(#lit)),
                    None => quote!(::core::option::Option::None),
                };
                quote_spanned! {span=>
                    let #local: #ty = wirer.config(#key, #default)?;
                }
            }
        };
        computes.push(compute);
        assigns.push(quote!(self.#member = #local;));
    }

    if computes.is_empty() {
        computes.push(quote!(let _ = wirer;));
    }

    Ok(quote! {
        impl #impl_generics ::appvisor::Wire for #ident #ty_generics #where_clause {
            fn wire(
                &mut self,
                wirer: &::appvisor::Wirer<'_>,
            ) -> ::core::result::Result<(), ::appvisor::WireError> {
                #(#computes)*
                #(#assigns)*
                ::core::result::Result::Ok(())
            }
        }
    })
}
