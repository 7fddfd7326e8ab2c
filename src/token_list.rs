/// Splits a comma separated header value such as `If-None-Match` into its
/// tokens.
///
/// Spaces around each token and empty list elements are dropped. Spaces
/// inside a token are kept. Malformed input never fails, it only yields
/// fewer tokens.
pub fn parse_token_list(value: &str) -> Vec<&str> {
    value
        .split(',')
        .map(|token| token.trim_matches(' '))
        .filter(|token| !token.is_empty())
        .collect()
}
