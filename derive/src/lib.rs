use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod from_message;
mod from_messages;
mod shape;

#[proc_macro_derive(FromMessage, attributes(field))]
pub fn derive_from_message(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match from_message::expand_from_message(&input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error().into(),
    }
}

#[proc_macro_derive(FromMessages, attributes(message))]
pub fn derive_from_messages(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match from_messages::expand_from_messages(&input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error().into(),
    }
}
