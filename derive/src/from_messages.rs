use std::collections::BTreeMap;

use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, Error, Ident, LitInt, Result};

use crate::shape::{Container, container, named_fields};

/// A struct field collecting one global message number.
struct Receiver {
    name: Ident,
    repeated: bool,
}

pub(crate) fn expand_from_messages(input: &DeriveInput) -> Result<TokenStream> {
    let mut receivers = BTreeMap::new();

    for field in named_fields(input, "FromMessages")? {
        let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("message")) else {
            continue;
        };

        let number = attr.parse_args::<LitInt>()?;
        let global = number.base10_parse::<u16>()?;

        let receiver = Receiver {
            name: field.ident.clone().ok_or_else(|| Error::new_spanned(field, "Field must be named."))?,
            repeated: matches!(container(&field.ty)?, Container::Vec(_)),
        };

        if receivers.insert(global, receiver).is_some() {
            Err(Error::new_spanned(number, "Message numbers must be unique."))?
        }
    }

    let arms = receivers.iter().map(|(global, Receiver { name, repeated })| {
        let receive = if *repeated {
            quote! {
                self.#name.push(Default::default());
                self.#name.last_mut().map(|m| m as &mut dyn FromMessage)
            }
        } else {
            quote! { Some(self.#name.insert(Default::default())) }
        };

        quote! { #global => { #receive } }
    });

    let name = &input.ident;

    Ok(quote! {
        impl FromMessages for #name {
            fn add_message(&mut self, global: u16) -> Option<&mut dyn FromMessage> {
                match global {
                    #(#arms)*
                    _ => None,
                }
            }
        }
    }
    .into())
}
