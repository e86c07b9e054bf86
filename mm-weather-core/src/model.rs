use serde::Serialize;

/// Posted to the whole channel, as opposed to "ephemeral".
pub const IN_CHANNEL: &str = "in_channel";

/// The three fields we read from a provider response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherSnapshot {
    pub location_name: String,
    pub temperature_c: f64,
    pub condition: String,
}

/// Slash command response body understood by Mattermost.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub response_type: String,
    pub text: String,
}

impl ChatResponse {
    pub fn in_channel(text: String) -> Self {
        Self {
            response_type: IN_CHANNEL.to_string(),
            text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_field_order_and_names() {
        let body = serde_json::to_string(&ChatResponse::in_channel("hi".into())).unwrap();
        assert_eq!(body, r#"{"response_type":"in_channel","text":"hi"}"#);
    }
}
