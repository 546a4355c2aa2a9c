//! Implementation of the `interpose` attribute
//!
//! Given
//!
//! ```ignore
//! #[interpose(symbol = "close")]
//! fn close(real: CloseFn, fd: c_int) -> c_int { ... }
//! ```
//!
//! this generates:
//! 1. An exported `extern "C" fn close(fd: c_int) -> c_int`
//! 2. A `RealSymbol` static for `close` local to that function
//! 3. The original body as a private function taking the resolved `real`

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::spanned::Spanned;
use syn::{Error, FnArg, Ident, ItemFn, LitByteStr, LitStr, Pat, PatType, Result, Type};

pub fn expand(attr: TokenStream, item: TokenStream) -> Result<TokenStream> {
	let input_fn: ItemFn = syn::parse2(item)?;
	let symbol = parse_symbol(attr, &input_fn.sig.ident)?;

	let (real_ty, args) = split_arguments(&input_fn)?;
	let arg_names: Vec<&Ident> = args.iter().map(|(name, _)| *name).collect();
	let arg_types: Vec<&Type> = args.iter().map(|(_, ty)| *ty).collect();

	let fn_name = &input_fn.sig.ident;
	let fn_attrs = &input_fn.attrs;
	let fn_vis = &input_fn.vis;
	let output = &input_fn.sig.output;
	let impl_name = format_ident!("__filehook_{}_impl", fn_name);
	let export_name = LitStr::new(&symbol, input_fn.sig.ident.span());
	let name_bytes = LitByteStr::new(format!("{}\0", symbol).as_bytes(), input_fn.sig.ident.span());

	let mut impl_fn = input_fn.clone();
	impl_fn.sig.ident = impl_name.clone();
	impl_fn.vis = syn::Visibility::Inherited;
	impl_fn.attrs.clear();

	let call = if input_fn.sig.unsafety.is_some() {
		quote! { unsafe { #impl_name(__filehook_real, #(#arg_names),*) } }
	} else {
		quote! { #impl_name(__filehook_real, #(#arg_names),*) }
	};

	Ok(quote! {
		#(#fn_attrs)*
		#[unsafe(export_name = #export_name)]
		#fn_vis unsafe extern "C" fn #fn_name(#(#arg_names: #arg_types),*) #output {
			static REAL: ::filehook::RealSymbol = ::filehook::RealSymbol::new(
				match ::core::ffi::CStr::from_bytes_with_nul(#name_bytes) {
					::core::result::Result::Ok(name) => name,
					::core::result::Result::Err(_) => panic!("symbol name contains a nul byte"),
				},
			);
			let __filehook_real: #real_ty = unsafe { ::filehook::ffi::resolve_or_abort::<#real_ty>(&REAL) };
			#call
		}

		#[inline(always)]
		#impl_fn
	})
}

/// Parse `symbol = "name"`, defaulting to the function name
fn parse_symbol(attr: TokenStream, fn_name: &Ident) -> Result<String> {
	if attr.is_empty() {
		return Ok(fn_name.to_string());
	}

	let mut symbol = None;
	let parser = syn::meta::parser(|meta| {
		if meta.path.is_ident("symbol") {
			let value: LitStr = meta.value()?.parse()?;
			symbol = Some(value.value());
			Ok(())
		} else {
			Err(meta.error("unsupported interpose argument, expected `symbol = \"...\"`"))
		}
	});
	syn::parse::Parser::parse2(parser, attr)?;

	let symbol = symbol.unwrap_or_else(|| fn_name.to_string());
	if symbol.is_empty() || symbol.contains('\0') {
		return Err(Error::new(fn_name.span(), "symbol name must be non-empty and contain no nul bytes"));
	}
	Ok(symbol)
}

/// Split the signature into the real-function type and the C arguments
///
/// A hook must:
/// 1. Take the genuine implementation as its first argument
/// 2. Name every other argument with a plain identifier
/// 3. Not be a method, generic or async
fn split_arguments(input_fn: &ItemFn) -> Result<(&Type, Vec<(&Ident, &Type)>)> {
	let sig = &input_fn.sig;
	if let Some(asyncness) = &sig.asyncness {
		return Err(Error::new(asyncness.span(), "interposed functions cannot be async"));
	}
	if !sig.generics.params.is_empty() {
		return Err(Error::new(sig.generics.span(), "interposed functions cannot be generic"));
	}
	if let Some(variadic) = &sig.variadic {
		return Err(Error::new(variadic.span(), "declare the optional argument explicitly instead of `...`"));
	}

	let mut typed = Vec::with_capacity(sig.inputs.len());
	for arg in &sig.inputs {
		match arg {
			FnArg::Receiver(r) => return Err(Error::new(r.span(), "interposed functions cannot be methods")),
			FnArg::Typed(PatType { pat, ty, .. }) => match &**pat {
				Pat::Ident(p) if p.by_ref.is_none() && p.subpat.is_none() => typed.push((&p.ident, &**ty)),
				_ => return Err(Error::new(pat.span(), "arguments must be plain identifiers")),
			},
		}
	}

	if typed.is_empty() {
		return Err(Error::new(
			sig.span(),
			"the first argument must receive the genuine implementation, e.g. `real: CloseFn`",
		));
	}
	let (_, real_ty) = typed.remove(0);
	Ok((real_ty, typed))
}
