//! Writer: serializes the ordered pairs back to `.sm` text.

use super::lex::KeyValue;

/// Writes every pair as `#KEY:VALUE;` on its own line, in order.
///
/// Together with the tokenizer this round-trips: parsing the output of
/// `unparse` yields the same pairs, and a document already in this
/// canonical form comes back byte-identical.
#[must_use]
pub fn unparse(pairs: &[KeyValue]) -> String {
    let mut out = String::new();
    for pair in pairs {
        out.push('#');
        out.push_str(&pair.key);
        out.push(':');
        out.push_str(&pair.value);
        out.push_str(";\n");
    }
    out
}
