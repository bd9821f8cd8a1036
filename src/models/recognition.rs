use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// 识别模型返回的学生信息
///
/// 只接受 JSON 对象，只有两个可选字段；多余的键被忽略，其它形状（数组、字符串等）解析失败。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecognitionResult {
    #[serde(rename = "学号")]
    pub student_id: Option<String>,

    #[serde(rename = "姓名")]
    pub student_name: Option<String>,
}

impl RecognitionResult {
    pub fn new(student_id: impl Into<String>, student_name: impl Into<String>) -> Self {
        Self {
            student_id: Some(student_id.into()),
            student_name: Some(student_name.into()),
        }
    }
}

impl<'de> Deserialize<'de> for RecognitionResult {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(ResultVisitor)
    }
}

struct ResultVisitor;

impl<'de> Visitor<'de> for ResultVisitor {
    type Value = RecognitionResult;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an object with 学号 and 姓名")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut result = RecognitionResult::default();

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "学号" | "student_id" | "studentId" | "id" => {
                    result.student_id = map.next_value::<Text>()?.0;
                }
                "姓名" | "student_name" | "studentName" | "name" => {
                    result.student_name = map.next_value::<Text>()?.0;
                }
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }

        Ok(result)
    }
}

/// 单个字段的值
struct Text(Option<String>);

impl<'de> Deserialize<'de> for Text {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_text(deserializer).map(Text)
    }
}

// 学号可能被模型返回为数字，统一转成字符串
fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct TextVisitor;

    impl<'de> Visitor<'de> for TextVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string, an integer or null")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if value.fract() == 0.0 && value.is_finite() {
                Ok(Some(format!("{}", value as i64)))
            } else {
                Ok(Some(value.to_string()))
            }
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(TextVisitor)
}
