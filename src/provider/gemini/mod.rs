pub mod client;
pub mod image;
pub mod speech;
pub mod text;
pub mod types;

pub use image::GeminiImageAdapter;
pub use speech::GeminiSpeechAdapter;
pub use text::GeminiTextAdapter;

#[cfg(test)]
macro_rules! impl_with_gemini_base_url {
    ($ty:ty) => {
        impl $ty {
            pub fn with_base_url(mut self, base_url: String) -> Self {
                self.http = self.http.with_base_url(base_url);
                self
            }
        }
    };
}

#[cfg(test)]
pub(crate) use impl_with_gemini_base_url;

#[cfg(test)]
pub(crate) mod test_support {
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockBuilder};

    pub const GENERATE_CONTENT_PATH_REGEX: &str = r"^/v1beta/models/[^/]+:generateContent$";

    pub fn post_path_regex(regex: &str) -> MockBuilder {
        Mock::given(method("POST")).and(path_regex(regex))
    }
}
