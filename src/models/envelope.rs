use serde::{Deserialize, Deserializer};

/// 服务端统一响应包装 `{ success, data, message }`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// `success` 为真且带有数据时返回数据
    pub fn into_data(self) -> Option<T> {
        if self.success {
            self.data
        } else {
            None
        }
    }
}

/// 有的接口直接返回对象，有的包在 `data` 里，两种都接受
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MaybeWrapped<T> {
    Bare(T),
    Wrapped(ApiEnvelope<T>),
}

impl<T> MaybeWrapped<T> {
    pub fn into_inner(self) -> Option<T> {
        match self {
            MaybeWrapped::Bare(value) => Some(value),
            MaybeWrapped::Wrapped(envelope) => envelope.data,
        }
    }
}

/// 兼容字符串和整数两种写法的 ID
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer id")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

/// 兼容数字和数字字符串（例如 `"10"`）的非负整数
pub fn deserialize_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct CountVisitor;

    impl<'de> Visitor<'de> for CountVisitor {
        type Value = u64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a non-negative number or numeric string")
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value)
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            u64::try_from(value).map_err(|_| E::custom(format!("negative value: {}", value)))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            // u64::MAX as f64 == 2^64，已超出范围
            let rounded = value.round();
            if rounded.is_finite() && rounded >= 0.0 && rounded < u64::MAX as f64 {
                Ok(rounded as u64)
            } else {
                Err(E::custom(format!("invalid value: {}", value)))
            }
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            value
                .trim()
                .parse::<f64>()
                .map_err(|_| E::custom(format!("not a number: {}", value)))
                .and_then(|v| self.visit_f64(v))
        }
    }

    deserializer.deserialize_any(CountVisitor)
}

/// 兼容数字和数字字符串（例如 `"66.67"`）的小数
pub fn deserialize_decimal<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Decimal {
        Number(f64),
        Text(String),
    }

    match Decimal::deserialize(deserializer)? {
        Decimal::Number(value) => Ok(value),
        Decimal::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("not a number: {}", text))),
    }
}
