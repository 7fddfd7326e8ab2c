use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use axum::body::Body;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::Stream;
use tokio::fs::File;

use crate::body::Representation;
use crate::stream::ReadStream;

/// Size and modification time of a [`Resource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceMetadata {
    /// Byte size. `None` for anything that is not a regular file, such as a
    /// pipe or a character device, whose length is not known up front.
    pub size: Option<u64>,
    pub modified: Option<SystemTime>,
}

impl From<&std::fs::Metadata> for ResourceMetadata {
    fn from(metadata: &std::fs::Metadata) -> Self {
        ResourceMetadata {
            size: metadata.is_file().then(|| metadata.len()),
            modified: metadata.modified().ok(),
        }
    }
}

/// A file served by path. Implements [`IntoResponse`].
///
/// The file is only opened once the body is polled, so a response that
/// ends up as `304` or `412` never touches the file contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    path: PathBuf,
}

impl Resource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Resource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Calls [`tokio::fs::metadata`] to determine size and modification time.
    pub async fn stat(&self) -> io::Result<ResourceMetadata> {
        let metadata = tokio::fs::metadata(&self.path).await?;
        Ok(ResourceMetadata::from(&metadata))
    }

    /// Content type guessed from the file extension.
    pub fn content_type(&self) -> String {
        mime_guess::from_path(&self.path)
            .first_or_octet_stream()
            .to_string()
    }

    /// Sequential stream over the file contents. Opening errors surface as
    /// the first item.
    pub fn into_stream(self) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
        async_stream::try_stream! {
            let file = File::open(&self.path).await?;
            for await chunk in ReadStream::new(file) {
                yield chunk?;
            }
        }
    }
}

impl IntoResponse for Resource {
    fn into_response(self) -> Response {
        let content_type = self.content_type();
        let mut response = Body::from_stream(self.clone().into_stream()).into_response();
        if let Ok(value) = content_type.parse() {
            response.headers_mut().insert(header::CONTENT_TYPE, value);
        }
        response.extensions_mut().insert(Representation::Resource(self));
        response
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;

    use super::Resource;

    #[tokio::test]
    async fn test_file_size() {
        let metadata = Resource::new("test/fixture.txt").stat().await.unwrap();
        assert_eq!(Some(54), metadata.size);
        assert!(metadata.modified.is_some());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = Resource::new("test/does_not_exist.txt").stat().await.unwrap_err();
        assert_eq!(std::io::ErrorKind::NotFound, err.kind());
    }

    #[tokio::test]
    async fn test_stream_contents() {
        let chunks: Vec<_> = Resource::new("test/fixture.txt").into_stream().try_collect().await.unwrap();
        let contents = chunks.concat();
        assert_eq!(std::fs::read("test/fixture.txt").unwrap(), contents);
    }

    #[test]
    fn test_content_type() {
        assert_eq!("text/plain", Resource::new("test/fixture.txt").content_type());
        assert_eq!("application/octet-stream", Resource::new("test/fixture").content_type());
    }
}
