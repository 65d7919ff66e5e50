//! Attribute macros running an async function on a `strand::Runtime`.

mod utils;

use proc_macro::{TokenStream, TokenTree};

/// Marks the async entry point of a program.
///
/// ```rust,ignore
/// #[strand::main]
/// async fn main() -> anyhow::Result<()> {
///     strand::time::sleep(std::time::Duration::from_millis(10)).await;
///     Ok(())
/// }
/// ```
///
/// expands to a synchronous `main` that blocks on the body.
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        return utils::error("#[strand::main] takes no arguments");
    }

    let mut tokens: Vec<TokenTree> = item.into_iter().collect();
    utils::strip_async(&mut tokens);

    if !utils::wrap_body(&mut tokens) {
        return utils::error("#[strand::main] expects a function with a body");
    }

    tokens.into_iter().collect()
}

/// Marks an async test function.
///
/// The test runs to completion on its own runtime. Tests may return a
/// `Result`, as with plain `#[test]`.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        return utils::error("#[strand::test] takes no arguments");
    }

    let mut tokens: Vec<TokenTree> = item.into_iter().collect();
    utils::strip_async(&mut tokens);

    if !utils::wrap_body(&mut tokens) {
        return utils::error("#[strand::test] expects a function with a body");
    }

    let mut result: Vec<TokenTree> = "#[test]".parse::<TokenStream>().into_iter().flatten().collect();
    result.extend(tokens);

    result.into_iter().collect()
}
