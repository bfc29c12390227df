//! Terraform expression helpers.
//!
//! Functions taking a `traversal` expect a bare reference such as
//! `module.np-demo.cluster_endpoint` (see [`Address::traversal`]) and return a
//! complete `${...}` interpolation string.
//!
//! [`Address::traversal`]: super::Address::traversal

/// Quote a value as an HCL string literal.
pub fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// Escape literal text so Terraform does not treat `${` or `%{` as template sequences.
pub fn escape_literal(text: &str) -> String {
    text.replace("${", "$${").replace("%{", "%%{")
}

/// `${lookup(map, "key", "default")}`
pub fn lookup(map_traversal: &str, key: &str, default: &str) -> String {
    format!(
        "${{lookup({}, {}, {})}}",
        map_traversal,
        quote(key),
        quote(default)
    )
}

/// `${jsonencode({ key = expr, ... })}`
pub fn jsonencode_object(fields: &[(&str, String)]) -> String {
    format!("${{jsonencode({})}}", object(fields))
}

/// `${base64decode(expr)}`
pub fn base64decode(traversal: &str) -> String {
    format!("${{base64decode({})}}", traversal)
}

/// `${replace(expr, "from", "to")}`
pub fn replace(traversal: &str, from: &str, to: &str) -> String {
    format!("${{replace({}, {}, {})}}", traversal, quote(from), quote(to))
}

/// `${templatefile("${path.module}/<path>", { var = expr, ... })}`
pub fn templatefile(relative_path: &str, vars: &[(&str, String)]) -> String {
    format!(
        "${{templatefile(\"${{path.module}}/{}\", {})}}",
        relative_path,
        object(vars)
    )
}

/// `${file("${path.module}/<path>")}`
pub fn file(relative_path: &str) -> String {
    format!("${{file(\"${{path.module}}/{}\")}}", relative_path)
}

fn object(fields: &[(&str, String)]) -> String {
    let inner = fields
        .iter()
        .map(|(k, v)| format!("{} = {}", k, v))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{ {} }}", inner)
}
