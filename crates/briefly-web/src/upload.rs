use axum::extract::Multipart;

use briefly_core::{InputBundle, UploadedFile, WORD_LENGTH_DEFAULT};

/// Parse the summarize form into an [`InputBundle`].
///
/// Fields: `text`, `url`, `file`, `word_length`. A file part with no name
/// and no bytes (what browsers send for an empty file input) counts as
/// absent. Unknown fields are ignored.
pub async fn parse_multipart(mut multipart: Multipart) -> Result<InputBundle, String> {
    let mut input = InputBundle::new(WORD_LENGTH_DEFAULT);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Failed to read form field: {}", e))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| format!("Failed to read file data: {}", e))?
                    .to_vec();

                if !(filename.is_empty() && data.is_empty()) {
                    input.file = Some(UploadedFile::new(filename, data));
                }
            }
            "text" => {
                let val = field
                    .text()
                    .await
                    .map_err(|e| format!("Failed to read text: {}", e))?;
                input.text = Some(val);
            }
            "url" => {
                let val = field
                    .text()
                    .await
                    .map_err(|e| format!("Failed to read url: {}", e))?;
                if !val.trim().is_empty() {
                    input.url = Some(val);
                }
            }
            "word_length" => {
                let val = field
                    .text()
                    .await
                    .map_err(|e| format!("Failed to read word_length: {}", e))?;
                let val = val.trim();
                if !val.is_empty() {
                    input.word_length = val
                        .parse()
                        .map_err(|_| format!("Invalid word_length: {}", val))?;
                }
            }
            _ => {
                let _ = field.bytes().await;
            }
        }
    }

    Ok(input)
}
