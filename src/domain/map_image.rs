use base64::Engine;
use base64::engine::general_purpose::STANDARD;

#[derive(Clone, Debug, PartialEq)]
pub struct MapImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl MapImage {
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.content_type, STANDARD.encode(&self.bytes))
    }
}
