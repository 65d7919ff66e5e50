use proc_macro::{Delimiter, Group, TokenStream, TokenTree};

/// Removes the `async` qualifier from a function signature.
pub(crate) fn strip_async(tokens: &mut Vec<TokenTree>) {
    if let Some(pos) = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "async"))
    {
        tokens.remove(pos);
    }
}

/// Replaces the function body with one that blocks on it inside a fresh
/// `strand::Runtime`.
///
/// The body's tail value is returned, so the function keeps its declared
/// return type. Returns `false` if the item has no body.
pub(crate) fn wrap_body(tokens: &mut [TokenTree]) -> bool {
    let Some(pos) = tokens
        .iter()
        .rposition(|t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Brace))
    else {
        return false;
    };

    let TokenTree::Group(group) = &tokens[pos] else {
        return false;
    };

    let wrapped = format!(
        "{{
            let runtime = ::strand::Runtime::new();
            runtime.block_on(async move {{ {} }})
        }}",
        group.stream()
    );

    let Ok(stream) = wrapped.parse::<TokenStream>() else {
        return false;
    };

    tokens[pos] = TokenTree::Group(Group::new(Delimiter::Brace, stream));
    true
}

/// Builds a `compile_error!` invocation carrying `message`.
pub(crate) fn error(message: &str) -> TokenStream {
    format!("compile_error!({message:?});")
        .parse()
        .unwrap_or_default()
}
