//! JWT Claims 構造体（ID トークン・アクセストークン共通）。

use serde::Deserialize;

/// Claims は検証済みトークンのペイロード。
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    /// ユーザーの一意識別子
    pub sub: String,

    /// トークン発行者
    pub iss: String,

    /// オーディエンス（検証対象外、ログ用途のみ）
    #[serde(default)]
    pub aud: Audience,

    /// トークンの有効期限（Unix タイムスタンプ）
    pub exp: u64,

    #[serde(default)]
    pub iat: Option<u64>,

    /// `id` または `access`
    #[serde(default)]
    pub token_use: Option<String>,

    /// ID トークンのユーザー名
    #[serde(default, rename = "cognito:username")]
    pub cognito_username: Option<String>,

    /// アクセストークンのユーザー名
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub email: Option<String>,
}

/// Audience は JWT の aud Claim を表す。
/// 文字列または文字列配列のどちらも受け付ける。
#[derive(Debug, Clone, Default)]
pub struct Audience(pub Vec<String>);

impl<'de> Deserialize<'de> for Audience {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de;

        struct AudienceVisitor;

        impl<'de> de::Visitor<'de> for AudienceVisitor {
            type Value = Audience;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a string or array of strings")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Audience(vec![v.to_string()]))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut values = Vec::new();
                while let Some(v) = seq.next_element::<String>()? {
                    values.push(v);
                }
                Ok(Audience(values))
            }
        }

        deserializer.deserialize_any(AudienceVisitor)
    }
}

impl Claims {
    /// トークン種別に関わらずユーザー名を返す。
    pub fn preferred_username(&self) -> Option<&str> {
        self.cognito_username
            .as_deref()
            .or(self.username.as_deref())
    }
}

/// CallerIdentity は検証済みトークンから得た呼び出し元の識別情報。
/// ストレージキーのスコープには常に `subject` を使う。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub subject: String,
    pub username: Option<String>,
}

impl From<Claims> for CallerIdentity {
    fn from(claims: Claims) -> Self {
        let username = claims.preferred_username().map(str::to_string);
        Self {
            subject: claims.sub,
            username,
        }
    }
}

impl std::fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.username {
            Some(name) => write!(f, "{} ({})", self.subject, name),
            None => write!(f, "{}", self.subject),
        }
    }
}
