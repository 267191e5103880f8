use std::collections::HashMap;

use darling::{FromDeriveInput, FromVariant, ast::Data, util::Ignored};
use proc_macro::{self, TokenStream};
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

#[derive(Debug)]
#[derive(FromVariant)]
#[darling(attributes(encoded), and_then = "Self::validate")]
struct Variant {
    ident: syn::Ident,
    discriminant: Option<syn::Expr>,
    mnemonic: Option<String>,
}

impl Variant {
    fn validate(self) -> darling::Result<Self> {
        if self.discriminant.is_none() {
            return Err(darling::Error::custom("every variant needs its bit pattern as an explicit discriminant")
                .with_span(&self.ident));
        }
        Ok(self)
    }

    fn bits(&self) -> darling::Result<u32> {
        match &self.discriminant {
            Some(syn::Expr::Lit(syn::ExprLit { lit: syn::Lit::Int(int), .. })) => {
                int.base10_parse::<u32>().map_err(darling::Error::from)
            }
            Some(other) => Err(darling::Error::custom("discriminant must be an integer literal")
                .with_span(other)),
            None => Err(darling::Error::custom("missing discriminant").with_span(&self.ident)),
        }
    }

    fn mnemonic(&self) -> String {
        match &self.mnemonic {
            Some(name) => name.clone(),
            None => self.ident.to_string().to_lowercase(),
        }
    }
}

#[derive(Debug)]
#[derive(FromDeriveInput)]
#[darling(attributes(encoded), supports(enum_unit))]
struct EncodedEnum {
    ident: syn::Ident,
    data: Data<Variant, Ignored>,
    width: u32,
}

/// Implements `isa_table::Encoded` for a fieldless enum whose discriminants are the bit
/// patterns of an instruction field.
///
/// ```ignore
/// #[derive(Copy, Clone, Debug, PartialEq, Eq, Encoded)]
/// #[encoded(width = 6)]
/// enum Funct {
///     Sll = 0x00,
///     #[encoded(mnemonic = "and")]
///     BitAnd = 0x24,
/// }
/// ```
#[proc_macro_derive(Encoded, attributes(encoded))]
pub fn derive_encoded(input: TokenStream) -> TokenStream {
    let input: DeriveInput = parse_macro_input!(input);
    let encoded_enum = match EncodedEnum::from_derive_input(&input) {
        Ok(parsed) => parsed,
        Err(err) => return err.write_errors().into(),
    };

    match expand(encoded_enum) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.write_errors().into(),
    }
}

fn expand(encoded_enum: EncodedEnum) -> darling::Result<proc_macro2::TokenStream> {
    let ident = encoded_enum.ident;
    let width = encoded_enum.width;

    if width == 0 || width > 32 {
        return Err(darling::Error::custom("width must be within 1..=32 bits").with_span(&ident));
    }
    let limit = 1u64 << width;

    let Some(variants) = encoded_enum.data.take_enum() else {
        return Err(darling::Error::unsupported_shape("struct").with_span(&ident));
    };

    let mut errors = darling::Error::accumulator();
    let mut seen = HashMap::new();

    let mut names = Vec::new();
    let mut ordinals = Vec::new();
    let mut patterns = Vec::new();
    let mut mnemonics = Vec::new();

    for variant in variants {
        let Some(bits) = errors.handle(variant.bits()) else {
            continue;
        };

        if u64::from(bits) >= limit {
            errors.push(darling::Error::custom(format!("{:#x} does not fit in {} bits", bits, width))
                .with_span(&variant.ident));
            continue;
        }
        if let Some(previous) = seen.insert(bits, variant.ident.clone()) {
            errors.push(darling::Error::custom(format!("bit pattern {:#x} already used by {}", bits, previous))
                .with_span(&variant.ident));
            continue;
        }

        ordinals.push(names.len());
        patterns.push(bits);
        mnemonics.push(variant.mnemonic());
        names.push(variant.ident);
    }

    errors.finish()?;

    let count = names.len();

    Ok(quote! {
        impl #ident {
            pub const COUNT: usize = #count;
            pub const ALL: [#ident; #count] = [#(#ident::#names),*];

            #[inline(always)]
            pub const fn ordinal(self) -> usize {
                match self {
                    #(#ident::#names => #ordinals,)*
                }
            }

            #[inline(always)]
            pub const fn bits(self) -> u32 {
                match self {
                    #(#ident::#names => #patterns,)*
                }
            }

            #[inline(always)]
            pub const fn from_bits(bits: u32) -> Option<#ident> {
                match bits {
                    #(#patterns => Some(#ident::#names),)*
                    _ => None,
                }
            }

            pub const fn mnemonic(self) -> &'static str {
                match self {
                    #(#ident::#names => #mnemonics,)*
                }
            }
        }

        impl ::isa_table::Encoded for #ident {
            const COUNT: usize = #count;
            const WIDTH: u32 = #width;
            type ArrayType<T> = [T; #count];

            #[inline(always)]
            fn ordinal(self) -> usize { #ident::ordinal(self) }

            #[inline(always)]
            fn from_ordinal(ordinal: usize) -> Option<Self> {
                #ident::ALL.get(ordinal).copied()
            }

            #[inline(always)]
            fn bits(self) -> u32 { #ident::bits(self) }

            #[inline(always)]
            fn from_bits(bits: u32) -> Option<Self> { #ident::from_bits(bits) }

            fn mnemonic(self) -> &'static str { #ident::mnemonic(self) }

            fn array_from_fn<T>(mut f: impl FnMut(Self) -> T) -> Self::ArrayType<T> {
                std::array::from_fn(|i| f(#ident::ALL[i]))
            }
        }
    })
}
