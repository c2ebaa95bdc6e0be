use syn::{
    Data, DeriveInput, Error, Field, Fields, GenericArgument, PathArguments, Result, Type,
};

/// Named fields of the struct a macro is applied to.
pub(crate) fn named_fields<'a>(input: &'a DeriveInput, derive: &str) -> Result<Vec<&'a Field>> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Ok(fields.named.iter().collect()),
            _ => Err(Error::new_spanned(
                input,
                format!("`{derive}` may only be derived on structs with named fields."),
            )),
        },
        _ => Err(Error::new_spanned(
            input,
            format!("`{derive}` may only be derived on structs."),
        )),
    }
}

/// A single-parameter container a macro knows how to fill.
pub(crate) enum Container {
    Option(Type),
    Vec(Type),
}

/// Classify a field type as `Option<T>` or `Vec<T>`.
pub(crate) fn container(ty: &Type) -> Result<Container> {
    let unsupported = || Error::new_spanned(ty, "Field must have an `Option<T>` or `Vec<T>` type.");

    let Type::Path(path) = ty else {
        return Err(unsupported());
    };
    let segment = path.path.segments.last().ok_or_else(unsupported)?;

    let PathArguments::AngleBracketed(arguments) = &segment.arguments else {
        return Err(unsupported());
    };
    let Some(GenericArgument::Type(inner)) = arguments.args.first() else {
        return Err(unsupported());
    };

    if segment.ident == "Option" {
        Ok(Container::Option(inner.clone()))
    } else if segment.ident == "Vec" {
        Ok(Container::Vec(inner.clone()))
    } else {
        Err(unsupported())
    }
}
