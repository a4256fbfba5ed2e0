//! Browser delivery: Blob, object URL and a synthetic `<a download>` click

use attestation_core::RenderedDocument;
use js_sys::{Array, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url};

/// Wrap raw bytes in a Blob of the given media type
pub fn to_blob(bytes: &[u8], media_type: &str) -> Result<Blob, JsValue> {
    let parts = Array::new();
    parts.push(&Uint8Array::from(bytes));
    let options = BlobPropertyBag::new();
    options.set_type(media_type);
    Blob::new_with_u8_array_sequence_and_options(&parts, &options)
}

/// Trigger a download of `document` under its file name.
///
/// The object URL is not revoked; it lives as long as the page.
pub fn download(document: &RenderedDocument) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("No window")?;
    let dom = window.document().ok_or("No document")?;
    let body = dom.body().ok_or("No body")?;

    let blob = to_blob(&document.bytes, document.media_type)?;
    let url = Url::create_object_url_with_blob(&blob)?;

    let anchor: HtmlAnchorElement = dom
        .create_element("a")?
        .dyn_into()
        .map_err(|_| JsValue::from_str("Failed to create anchor"))?;
    anchor.set_href(&url);
    anchor.set_download(&document.file_name);

    body.append_child(&anchor)?;
    anchor.click();
    body.remove_child(&anchor)?;
    Ok(())
}
