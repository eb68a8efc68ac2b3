use std::collections::HashMap;

struct Attr<'a> {
    name: &'a str,
    value: &'a str,
    // byte range of `name="value"` including the whitespace before it
    span: (usize, usize),
}

/// Set the `fill` attribute of every element whose `id` has an entry in
/// `fills`. Everything else is copied through untouched.
pub fn paint_markup(markup: &str, fills: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(markup.len() + fills.len() * 16);
    let mut rest = markup;
    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if tail.starts_with("<!--") {
            let end = tail.find("-->").map_or(tail.len(), |i| i + 3);
            out.push_str(&tail[..end]);
            rest = &tail[end..];
            continue;
        }
        let Some(end) = tag_end(tail) else {
            out.push_str(tail);
            return out;
        };
        let tag = &tail[..=end];
        match rewrite_tag(tag, fills) {
            Some(t) => out.push_str(&t),
            None => out.push_str(tag),
        }
        rest = &tail[end + 1..];
    }
    out.push_str(rest);
    out
}

fn tag_end(tag: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in tag.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '>' => return Some(i),
            None => {}
        }
    }
    None
}

fn is_delim(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b'/' || b == b'>'
}

fn attributes(tag: &str) -> (usize, Vec<Attr<'_>>) {
    let bytes = tag.as_bytes();
    let mut i = 1;
    while i < bytes.len() && !is_delim(bytes[i]) {
        i += 1;
    }
    let name_end = i;
    let mut attrs = Vec::new();
    loop {
        let lead = i;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let start = i;
        while i < bytes.len() && !is_delim(bytes[i]) && bytes[i] != b'=' {
            i += 1;
        }
        if i == start {
            break;
        }
        let name = &tag[start..i];
        let mut value = "";
        if i < bytes.len() && bytes[i] == b'=' {
            i += 1;
            if i < bytes.len() && (bytes[i] == b'"' || bytes[i] == b'\'') {
                let q = bytes[i] as char;
                let vs = i + 1;
                let ve = tag[vs..].find(q).map_or(bytes.len(), |p| vs + p);
                value = &tag[vs..ve];
                i = (ve + 1).min(bytes.len());
            } else {
                let vs = i;
                while i < bytes.len() && !is_delim(bytes[i]) {
                    i += 1;
                }
                value = &tag[vs..i];
            }
        }
        attrs.push(Attr {
            name,
            value,
            span: (lead, i),
        });
    }
    (name_end, attrs)
}

fn rewrite_tag(tag: &str, fills: &HashMap<String, String>) -> Option<String> {
    if tag.starts_with("</") || tag.starts_with("<!") || tag.starts_with("<?") {
        return None;
    }
    let (name_end, attrs) = attributes(tag);
    let id = attrs.iter().find(|a| a.name == "id")?.value;
    let fill = fills.get(id)?;

    let mut out = String::with_capacity(tag.len() + fill.len() + 8);
    out.push_str(&tag[..name_end]);
    out.push_str(" fill=\"");
    out.push_str(&escape_attr(fill));
    out.push('"');
    let mut cursor = name_end;
    for a in attrs.iter().filter(|a| a.name == "fill") {
        out.push_str(&tag[cursor..a.span.0]);
        cursor = a.span.1;
    }
    out.push_str(&tag[cursor..]);
    Some(out)
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}
