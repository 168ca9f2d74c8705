//! Chapter document helpers: `<body>` extraction and heading detection.

use quick_xml::events::Event;

use crate::error::EpubError;
use crate::opf::{collapse_whitespace, local_name, resolve_entity, xml_reader};

/// Return the inner markup of `<body>`, trimmed.
///
/// Documents without a body element are returned whole.
pub fn extract_body(html: &[u8]) -> Result<String, EpubError> {
    let mut reader = xml_reader(html);
    let mut buf = Vec::new();
    let mut body_start: Option<usize> = None;
    let mut depth = 0usize;

    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if local_name(e.name().as_ref()) == "body" => {
                if body_start.is_none() {
                    body_start = Some(reader.buffer_position() as usize);
                }
                depth += 1;
            }
            Event::Empty(e) if body_start.is_none() && local_name(e.name().as_ref()) == "body" => {
                return Ok(String::new());
            }
            Event::End(e) if local_name(e.name().as_ref()) == "body" => {
                depth = depth.saturating_sub(1);
                if let (Some(start), 0) = (body_start, depth) {
                    return slice_utf8(html, start, before);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    match body_start {
        Some(start) => slice_utf8(html, start, html.len()),
        None => slice_utf8(html, 0, html.len()),
    }
}

/// Text of the first `h1`..`h3` heading, falling back to `<title>`.
pub fn first_heading(html: &[u8]) -> Result<Option<String>, EpubError> {
    let mut reader = xml_reader(html);
    let mut buf = Vec::new();
    let mut capture: Option<String> = None;
    let mut text = String::new();
    let mut title: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if capture.is_none() => {
                let name = local_name(e.name().as_ref()).to_ascii_lowercase();
                if matches!(name.as_str(), "h1" | "h2" | "h3")
                    || (name == "title" && title.is_none())
                {
                    capture = Some(name);
                    text.clear();
                }
            }
            Event::Text(e) if capture.is_some() => {
                let chunk = e
                    .decode()
                    .map_err(|err| EpubError::Parse(format!("Decode error: {:?}", err)))?;
                text.push_str(&chunk);
            }
            Event::GeneralRef(e) if capture.is_some() => {
                let name = e
                    .decode()
                    .map_err(|err| EpubError::Parse(format!("Decode error: {:?}", err)))?;
                text.push_str(&resolve_entity(&name));
            }
            Event::End(e) => {
                let name = local_name(e.name().as_ref()).to_ascii_lowercase();
                if capture.as_deref() == Some(name.as_str()) {
                    capture = None;
                    let value = collapse_whitespace(&text);
                    if !value.is_empty() {
                        if name != "title" {
                            return Ok(Some(value));
                        }
                        title = Some(value);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(title)
}

fn slice_utf8(html: &[u8], start: usize, end: usize) -> Result<String, EpubError> {
    let end = end.min(html.len());
    let start = start.min(end);
    let body = std::str::from_utf8(&html[start..end])
        .map_err(|_| EpubError::Parse("chapter body is not valid UTF-8".into()))?;
    Ok(body.trim().to_string())
}
