use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Ident, LitStr, Type};

/// Derive macro for transform parameter declarations.
///
/// Generates two methods on the annotated struct:
///
/// - `config_params() -> Vec<ConfigParam>`: declarations exported over FFI
///   and used by the host to validate the user's config table.
/// - `from_config(&ConfigValues) -> Result<Self, PluginError>`: typed reads,
///   falling back to `Default` for absent optional params.
///
/// ```ignore
/// #[derive(ConfigParams)]
/// pub struct FlattenConfig {
///     #[param(description = "Log rejected records at warn level")]
///     pub log_rejected: bool,
/// }
/// ```
///
/// Supported field types: `bool`, `i64`, `u64`, `usize`, `String`.
#[proc_macro_derive(ConfigParams, attributes(param))]
pub fn derive_config_params(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

struct ParamAttr {
    description: String,
    required: bool,
}

fn derive_impl(input: &DeriveInput) -> Result<TokenStream2, syn::Error> {
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "ConfigParams only supports structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "ConfigParams only supports structs",
            ))
        }
    };

    let mut declarations = Vec::new();
    let mut readers = Vec::new();

    for field in fields {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected named field"))?;
        let attr = parse_param_attr(field_name, &field.attrs)?;
        let kind = FieldKind::of(&field.ty)?;

        let field_name_str = field_name.to_string();
        let description = &attr.description;
        let required = attr.required;
        let param_type = kind.param_type();
        let default_value = if required {
            quote! { None }
        } else {
            let value = kind.default_value(field_name);
            quote! { Some(#value) }
        };

        declarations.push(quote! {
            cdcflat_api::config::ConfigParam {
                name: #field_name_str.to_string(),
                param_type: #param_type,
                required: #required,
                default: #default_value,
                description: #description.to_string(),
            }
        });
        readers.push(kind.reader(field_name, &field_name_str, required));
    }

    Ok(quote! {
        impl #name {
            pub fn config_params() -> Vec<cdcflat_api::config::ConfigParam> {
                let __defaults = Self::default();
                vec![
                    #(#declarations),*
                ]
            }

            pub fn from_config(
                __config: &cdcflat_api::config::ConfigValues,
            ) -> Result<Self, cdcflat_api::error::PluginError> {
                let mut result = Self::default();
                #(#readers)*
                Ok(result)
            }
        }
    })
}

fn parse_param_attr(field_name: &Ident, attrs: &[syn::Attribute]) -> Result<ParamAttr, syn::Error> {
    let mut description: Option<String> = None;
    let mut required = false;

    for attr in attrs {
        if !attr.path().is_ident("param") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("description") {
                let value: LitStr = meta.value()?.parse()?;
                description = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("required") {
                required = true;
                Ok(())
            } else {
                Err(meta.error("expected `description = \"...\"` or `required`"))
            }
        })?;
    }

    let description = description.ok_or_else(|| {
        syn::Error::new_spanned(field_name, "missing #[param(description = \"...\")]")
    })?;
    Ok(ParamAttr { description, required })
}

#[derive(Clone, Copy)]
enum FieldKind {
    Bool,
    I64,
    U64,
    Usize,
    Str,
}

impl FieldKind {
    fn of(ty: &Type) -> Result<Self, syn::Error> {
        let ty_name = type_ident_name(ty)
            .ok_or_else(|| syn::Error::new_spanned(ty, "unsupported type for ConfigParams"))?;
        match ty_name.as_str() {
            "bool" => Ok(FieldKind::Bool),
            "i64" => Ok(FieldKind::I64),
            "u64" => Ok(FieldKind::U64),
            "usize" => Ok(FieldKind::Usize),
            "String" => Ok(FieldKind::Str),
            other => Err(syn::Error::new_spanned(
                ty,
                format!("unsupported type '{other}' (expected bool, i64, u64, usize, String)"),
            )),
        }
    }

    fn param_type(self) -> TokenStream2 {
        match self {
            FieldKind::Bool => quote! { cdcflat_api::config::ParamType::Bool },
            FieldKind::I64 => quote! { cdcflat_api::config::ParamType::I64 },
            FieldKind::U64 | FieldKind::Usize => quote! { cdcflat_api::config::ParamType::U64 },
            FieldKind::Str => quote! { cdcflat_api::config::ParamType::Str },
        }
    }

    fn default_value(self, field: &Ident) -> TokenStream2 {
        match self {
            FieldKind::Bool => quote! { cdcflat_api::config::ParamValue::Bool(__defaults.#field) },
            FieldKind::I64 => quote! { cdcflat_api::config::ParamValue::I64(__defaults.#field) },
            FieldKind::U64 => quote! { cdcflat_api::config::ParamValue::U64(__defaults.#field) },
            FieldKind::Usize => {
                quote! {
                    cdcflat_api::config::ParamValue::U64(
                        u64::try_from(__defaults.#field).unwrap_or(u64::MAX)
                    )
                }
            }
            FieldKind::Str => {
                quote! { cdcflat_api::config::ParamValue::Str(__defaults.#field.clone()) }
            }
        }
    }

    /// Expression reading the raw value as `Option<T>` from `__config`. May
    /// return early with a config error.
    fn getter(self, key: &str) -> TokenStream2 {
        match self {
            FieldKind::Bool => quote! { __config.get_bool(#key) },
            FieldKind::I64 => quote! { __config.get_i64(#key) },
            FieldKind::U64 => quote! { __config.get_u64(#key) },
            FieldKind::Usize => quote! {
                __config
                    .get_u64(#key)
                    .map(usize::try_from)
                    .transpose()
                    .map_err(|_| cdcflat_api::error::PluginError::config(
                        format!("parameter '{}' does not fit in usize", #key)
                    ))?
            },
            FieldKind::Str => quote! { __config.get_str(#key).map(str::to_string) },
        }
    }

    fn reader(self, field: &Ident, key: &str, required: bool) -> TokenStream2 {
        let getter = self.getter(key);
        if required {
            quote! {
                result.#field = #getter.ok_or_else(|| cdcflat_api::error::PluginError::config(
                    format!("missing required parameter '{}'", #key)
                ))?;
            }
        } else {
            quote! {
                if let Some(v) = #getter {
                    result.#field = v;
                }
            }
        }
    }
}

/// Last path segment of a type (`u64`, `String`, ...).
fn type_ident_name(ty: &Type) -> Option<String> {
    if let Type::Path(type_path) = ty {
        type_path
            .path
            .segments
            .last()
            .map(|seg| seg.ident.to_string())
    } else {
        None
    }
}
