use std::collections::BTreeMap;

use proc_macro::TokenStream;
use quote::{ToTokens, quote};
use syn::{
    Attribute, DeriveInput, Error, ExprClosure, Ident, LitInt, Pat, Result, Token, Type,
    parse::{Parse, ParseStream},
};

use crate::shape::{Container, container, named_fields};

pub(crate) fn expand_from_message(input: &DeriveInput) -> Result<TokenStream> {
    let mut fields = BTreeMap::new();
    let mut timestamp: Option<Target> = None;

    for field in named_fields(input, "FromMessage")? {
        let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("field")) else {
            continue;
        };

        let Selector { source, handler } = attr.parse_args()?;
        let target = Target::new(field, attr, handler)?;

        match source {
            Source::Number(number) => {
                let key = number.base10_parse::<u8>()?;
                if fields.insert(key, target).is_some() {
                    Err(Error::new_spanned(number, "Field identifiers must be unique."))?
                }
            }
            Source::Time => {
                if let Some(previous) = timestamp.replace(target) {
                    Err(Error::new_spanned(
                        previous.attr,
                        "Only one field may receive the timestamp.",
                    ))?
                }
            }
        }
    }

    let add_field = (!fields.is_empty()).then(|| {
        let arms = fields.iter().map(|(number, target)| {
            let ty = &target.value;
            let store = target.store(quote!(value));
            quote! {
                #number => {
                    if let Some(value) = field.value.get::<#ty>() {
                        #store;
                    }
                }
            }
        });

        quote! {
            fn add_field(&mut self, field: &::sprocket::Field) {
                match field.number {
                    #(#arms)*
                    _ => {}
                }
            }
        }
    });

    let add_timestamp = timestamp.map(|target| {
        let store = target.store(quote!(timestamp));
        quote! {
            fn add_timestamp(&mut self, timestamp: u32) {
                #store;
            }
        }
    });

    let name = &input.ident;

    Ok(quote! {
        impl FromMessage for #name {
            #add_field
            #add_timestamp
        }
    }
    .into())
}

/// Where a struct field's values come from.
enum Source {
    Number(LitInt),
    Time,
}

/// The contents of a `#[field(...)]` attribute.
struct Selector {
    source: Source,
    handler: Option<ExprClosure>,
}

impl Parse for Selector {
    fn parse(input: ParseStream) -> Result<Self> {
        let source = if input.peek(LitInt) {
            Source::Number(input.parse()?)
        } else {
            let ident = input.parse::<Ident>()?;
            if ident != "time" {
                Err(Error::new_spanned(
                    ident,
                    "Field identifier must be an integer literal or `time`.",
                ))?
            }
            Source::Time
        };

        let handler = match input.parse::<Option<Token![,]>>()? {
            Some(_) => Some(input.parse()?),
            None => None,
        };

        Ok(Self { source, handler })
    }
}

/// A struct field receiving values, and the type they are converted to.
struct Target {
    name: Ident,
    ty: Type,
    value: Type,
    handler: Option<ExprClosure>,
    attr: Attribute,
}

impl Target {
    fn new(field: &syn::Field, attr: &Attribute, handler: Option<ExprClosure>) -> Result<Self> {
        let name = field
            .ident
            .clone()
            .ok_or_else(|| Error::new_spanned(field, "Field must be named."))?;

        let value = match &handler {
            Some(handler) => {
                let mut inputs = handler.inputs.iter();
                match (inputs.next(), inputs.next(), inputs.next()) {
                    (Some(_), Some(Pat::Type(typed)), None) => (*typed.ty).clone(),
                    (Some(_), Some(_), None) => Err(Error::new_spanned(
                        handler,
                        "Handler closure's second parameter must be annotated with the expected value type.",
                    ))?,
                    _ => Err(Error::new_spanned(
                        handler,
                        "Handler closure must have two parameters.",
                    ))?,
                }
            }
            None => match container(&field.ty) {
                Ok(Container::Option(inner)) => inner,
                _ => Err(Error::new_spanned(
                    &field.ty,
                    "Field without a handler must have type `Option<T>`.",
                ))?,
            },
        };

        Ok(Self {
            name,
            ty: field.ty.clone(),
            value,
            handler,
            attr: attr.clone(),
        })
    }

    /// Statement storing `value` into the struct field.
    fn store(&self, value: impl ToTokens) -> impl ToTokens {
        let Self {
            name, ty, handler, ..
        } = self;

        match handler {
            Some(handler) => {
                let acc = &handler.inputs[0];
                let val = &handler.inputs[1];
                let body = &handler.body;
                quote! { (|#acc: &mut #ty, #val| { #body })(&mut self.#name, #value) }
            }
            None => quote! { self.#name = Some(#value) },
        }
    }
}
