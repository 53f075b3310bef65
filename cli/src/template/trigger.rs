use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Event sources a function can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub(crate) enum TriggerKind {
    Timer,

    #[serde(rename = "COS")]
    Cos,

    #[serde(rename = "CMQ")]
    Cmq,

    #[serde(rename = "CKafka")]
    Ckafka,

    #[serde(rename = "APIGW")]
    Apigw,
}

impl TriggerKind {
    /// Name of the trigger type in the cloud API
    pub(crate) fn api_name(&self) -> &'static str {
        match self {
            TriggerKind::Timer => "timer",
            TriggerKind::Cos => "cos",
            TriggerKind::Cmq => "cmq",
            TriggerKind::Ckafka => "ckafka",
            TriggerKind::Apigw => "apigw",
        }
    }
}

/// An entry of the function's `Events` section
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct Trigger {
    #[serde(rename = "Type")]
    pub(crate) kind: TriggerKind,

    /// Type specific settings, kept loose as every type has its own set
    #[serde(default)]
    pub(crate) properties: Value,
}

impl Trigger {
    /// Read a scalar property as a string, numbers and bools included
    fn property(&self, key: &str) -> Option<String> {
        match self.properties.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Triggers are enabled unless explicitly switched off
    pub(crate) fn is_enabled(&self) -> bool {
        match self.property("Enable") {
            Some(value) => matches!(
                value.to_lowercase().as_str(),
                "true" | "open" | "yes" | "y" | "1"
            ),
            None => true,
        }
    }

    /// Name of the trigger on the platform
    ///
    /// Bucket and queue based triggers are identified by the resource they listen to.
    pub(crate) fn remote_name(&self, name: &str) -> String {
        let key = match self.kind {
            TriggerKind::Cos => "Bucket",
            TriggerKind::Cmq | TriggerKind::Ckafka => "Name",
            TriggerKind::Timer | TriggerKind::Apigw => return name.to_string(),
        };

        self.property(key).unwrap_or_else(|| name.to_string())
    }

    /// The `TriggerDesc` argument of the cloud API
    pub(crate) fn description(&self) -> Option<String> {
        match self.kind {
            TriggerKind::Timer => self.property("CronExpression"),

            TriggerKind::Cos => Some(
                json!({
                    "event": self.property("Events").unwrap_or_default(),
                    "filter": {
                        "Prefix": self.properties.pointer("/Filter/Prefix").cloned().unwrap_or(json!("")),
                        "Suffix": self.properties.pointer("/Filter/Suffix").cloned().unwrap_or(json!("")),
                    },
                })
                .to_string(),
            ),

            TriggerKind::Cmq => None,

            TriggerKind::Ckafka => Some(
                json!({
                    "maxMsgNum": self.property("MaxMsgNum").unwrap_or("100".into()),
                    "offset": self.property("Offset").unwrap_or("latest".into()),
                })
                .to_string(),
            ),

            TriggerKind::Apigw => {
                let integrated = self
                    .property("IntegratedResponse")
                    .is_some_and(|v| v.eq_ignore_ascii_case("true"));

                let description = json!({
                    "api": {
                        "authRequired": "FALSE",
                        "requestConfig": {
                            "method": self.property("HttpMethod").unwrap_or("ANY".into()),
                        },
                        "isIntegratedResponse": if integrated { "TRUE" } else { "FALSE" },
                    },
                    "service": {
                        "serviceId": self.property("ServiceId").unwrap_or_default(),
                    },
                    "release": {
                        "environmentName": self.property("StageName").unwrap_or("release".into()),
                    },
                });

                Some(description.to_string())
            }
        }
    }

    /// Properties each trigger type can not be created without
    pub(crate) fn validate(&self, name: &str) -> Vec<String> {
        let required: &[&str] = match self.kind {
            TriggerKind::Timer => &["CronExpression"],
            TriggerKind::Cos => &["Bucket", "Events"],
            TriggerKind::Cmq | TriggerKind::Ckafka => &["Name"],
            TriggerKind::Apigw => &[],
        };

        required
            .iter()
            .filter(|key| self.property(key).is_none())
            .map(|key| format!("Trigger \"{name}\" is missing the \"{key}\" property"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trigger(kind: TriggerKind, properties: Value) -> Trigger {
        Trigger { kind, properties }
    }

    #[test]
    fn timer_description_is_the_cron_expression() {
        let timer = trigger(TriggerKind::Timer, json!({"CronExpression": "*/5 * * * *"}));
        assert_eq!(timer.description().as_deref(), Some("*/5 * * * *"));
        assert_eq!(timer.remote_name("every5m"), "every5m");
        assert!(timer.is_enabled());
    }

    #[test]
    fn cos_trigger_is_named_after_the_bucket() {
        let cos = trigger(
            TriggerKind::Cos,
            json!({"Bucket": "images-1250000000", "Events": "cos:ObjectCreated:*", "Filter": {"Prefix": "in/"}}),
        );

        assert_eq!(cos.remote_name("upload"), "images-1250000000");

        let desc: Value = serde_json::from_str(&cos.description().unwrap()).unwrap();
        assert_eq!(desc["event"], "cos:ObjectCreated:*");
        assert_eq!(desc["filter"]["Prefix"], "in/");
        assert_eq!(desc["filter"]["Suffix"], "");
    }

    #[test]
    fn enable_flag_accepts_strings_and_bools() {
        assert!(!trigger(TriggerKind::Timer, json!({"Enable": false})).is_enabled());
        assert!(!trigger(TriggerKind::Timer, json!({"Enable": "CLOSE"})).is_enabled());
        assert!(trigger(TriggerKind::Timer, json!({"Enable": "True"})).is_enabled());
    }

    #[test]
    fn missing_required_properties_are_reported() {
        let errors = trigger(TriggerKind::Cos, json!({"Bucket": "b"})).validate("upload");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Events"));
    }
}
