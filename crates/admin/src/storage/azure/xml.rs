//! Minimal XML handling for the Blob, Queue and File service responses.
//!
//! The services return small, flat documents, so elements are located by
//! plain string search rather than a full parser.

/// Contents of every `<tag>...</tag>` element in `body`, in document order.
pub fn elements<'a>(body: &'a str, tag: &str) -> Vec<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let mut found = Vec::new();
    let mut rest = body;
    while let Some(start) = rest.find(&open) {
        let after_open = start + open.len();
        let Some(tail) = rest.get(after_open..) else {
            break;
        };
        let Some(end) = tail.find(&close) else {
            break;
        };
        if let Some(content) = tail.get(..end) {
            found.push(content);
        }
        rest = tail.get(end + close.len()..).unwrap_or_default();
    }
    found
}

/// Contents of the first `<tag>...</tag>` element, if any.
pub fn element<'a>(body: &'a str, tag: &str) -> Option<&'a str> {
    elements(body, tag).into_iter().next()
}

/// Escape text for use inside an element.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Undo [`escape`], plus numeric character references.
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(rest.get(..amp).unwrap_or_default());
        let tail = rest.get(amp..).unwrap_or_default();
        let Some(semi) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };
        let entity = tail.get(1..semi).unwrap_or_default();
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .map(|hex| u32::from_str_radix(hex, 16))
                .or_else(|| entity.strip_prefix('#').map(str::parse::<u32>))
                .and_then(Result::ok)
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => out.push(c),
            None => out.push_str(tail.get(..=semi).unwrap_or_default()),
        }
        rest = tail.get(semi + 1..).unwrap_or_default();
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_repeated_elements() {
        let body = "<Entries><File><Name>a.pdf</Name></File><Directory><Name>sub</Name></Directory>\
                    <File><Name>b.png</Name></File></Entries>";
        let files: Vec<&str> = elements(body, "File")
            .into_iter()
            .filter_map(|f| element(f, "Name"))
            .collect();
        assert_eq!(files, vec!["a.pdf", "b.png"]);
        assert_eq!(element(body, "NextMarker"), None);
    }

    #[test]
    fn escape_round_trips_json() {
        let json = r#"{"Name":"Tom & Jerry's <mug>"}"#;
        assert_eq!(unescape(&escape(json)), json);
    }

    #[test]
    fn unescape_handles_numeric_and_unknown_entities() {
        assert_eq!(unescape("a&#65;b&#x42;c"), "aAbBc");
        assert_eq!(unescape("x &nbsp; y"), "x &nbsp; y");
        assert_eq!(unescape("dangling & end"), "dangling & end");
    }
}
