extern crate proc_macro;

use proc_macro::TokenStream;

mod interpose;

/// Export a function under a C library symbol name
///
/// The annotated function receives the genuine implementation as its first
/// argument, followed by the C arguments. The macro generates an
/// `extern "C"` function exported under the symbol name that resolves the
/// next definition of that name on first use (aborting if there is none)
/// and passes it to the body.
///
/// The symbol name defaults to the function name and can be set with
/// `symbol = "..."`.
///
/// # Example
///
/// ```ignore
/// use filehook::CloseFn;
/// use libc::c_int;
///
/// #[filehook::interpose]
/// fn close(real: CloseFn, fd: c_int) -> c_int {
///     unsafe { filehook::global().close(real, fd) }
/// }
/// ```
#[proc_macro_attribute]
pub fn interpose(attr: TokenStream, item: TokenStream) -> TokenStream {
	interpose::expand(attr.into(), item.into())
		.unwrap_or_else(syn::Error::into_compile_error)
		.into()
}
