//! # テンプレートフォーマッター
//!
//! 件名・本文テンプレートの `{name}` / `{name.attr.attr}` プレースホルダーを
//! [`TemplateParams`] の値で置換する。
//!
//! ## 文法
//!
//! | 記法 | 意味 |
//! |------|------|
//! | `}}` | リテラルの `}` |
//! | `{name}` | パラメータ `name` の表示文字列（未定義なら空文字列） |
//! | `{name.attr}` | パラメータ `name` の属性 `attr` の表示文字列 |
//! | `{name!s}` / `{name!r}` | 変換指定。`!r` はテキストを引用符付きの表現にする |
//! | `{name:spec}` | 書式指定 `[[fill]align][0][width][.precision][s]`（`align` は `<` `>` `^`） |
//!
//! `{` の直後には必ずパラメータ名が続く。`{{`、空のプレースホルダー `{}`、
//! 対応しない波括弧、`[...]` インデックス、存在しない属性へのアクセス、
//! 文字列に使えない書式指定（符号、`=` 揃え、`,` 区切り、`s` 以外の型）は
//! すべてフォーマット失敗となる。
//!
//! ## 設計方針
//!
//! - **失敗時はテンプレートをそのまま返す**: 通知そのものは止めない
//! - **件名と本文は独立**: 片方の失敗がもう片方に影響しない
//! - **幅と精度は文字数で数える**: バイト数ではない

use regex::Regex;
use statemail_domain::{
    notification::NotificationError,
    settings::{NotificationSettings, SETTINGS_ID, TemplateField},
    template::{TemplateParams, TemplateValue},
};
use thiserror::Error;

/// `}}` / `{name...}` / 単独の波括弧 のいずれかにマッチする
const TOKEN_PATTERN: &str = r"\}\}|\{([A-Za-z0-9_]+)([^{}]*)\}|[{}]";

/// 文字列に対して有効な書式指定
const SPEC_PATTERN: &str =
    r"^(?:(?P<fill>.)?(?P<align>[<>^]))?(?P<zero>0)?(?P<width>\d+)?(?:\.(?P<precision>\d+))?s?$";

/// フォーマット失敗の理由
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// 対応する相手のない `{` または `}`
    #[error("対応しない波括弧があります（位置: {position}）")]
    UnbalancedBrace { position: usize },

    /// プレースホルダーの書式が不正
    #[error("不正なプレースホルダーです: {0:?}")]
    InvalidField(String),

    /// 存在しない属性へのアクセス
    #[error("{path} に属性 {attribute} がありません")]
    MissingAttribute { path: String, attribute: String },

    /// `!s` / `!r` 以外の変換指定
    #[error("不明な変換指定です: {0:?}")]
    InvalidConversion(String),

    /// 文字列に適用できない書式指定
    #[error("不正な書式指定です: {0:?}")]
    InvalidFormatSpec(String),
}

/// フォーマット結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formatted {
    /// すべてのプレースホルダーを置換できた
    Rendered(String),
    /// 失敗したため、元のテンプレートをそのまま保持している
    Fallback { text: String, error: FormatError },
}

impl Formatted {
    pub fn text(&self) -> &str {
        match self {
            Self::Rendered(text) | Self::Fallback { text, .. } => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Rendered(text) | Self::Fallback { text, .. } => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    pub fn error(&self) -> Option<&FormatError> {
        match self {
            Self::Rendered(_) => None,
            Self::Fallback { error, .. } => Some(error),
        }
    }
}

/// テンプレートフォーマッター
#[derive(Debug, Clone)]
pub struct TemplateFormatter {
    token: Regex,
    spec:  Regex,
}

impl TemplateFormatter {
    pub fn new() -> Result<Self, NotificationError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| NotificationError::TemplateFailed(e.to_string()))
        };
        Ok(Self {
            token: compile(TOKEN_PATTERN)?,
            spec:  compile(SPEC_PATTERN)?,
        })
    }

    /// テンプレートをフォーマットする
    ///
    /// 失敗した場合は [`Formatted::Fallback`] に元のテンプレートと理由を入れて返す。
    pub fn format(&self, template: &str, params: &TemplateParams) -> Formatted {
        match self.render(template, params) {
            Ok(text) => Formatted::Rendered(text),
            Err(error) => Formatted::Fallback {
                text: template.to_string(),
                error,
            },
        }
    }

    /// 設定のテンプレート項目をフォーマットする
    ///
    /// 失敗時は `{SETTINGS_ID}.{field}` を添えて警告ログを出し、元のテンプレートを返す。
    pub fn format_setting(
        &self,
        settings: &NotificationSettings,
        field: TemplateField,
        params: &TemplateParams,
    ) -> String {
        let formatted = self.format(settings.template(field), params);
        if let Some(error) = formatted.error() {
            let setting = format!("{SETTINGS_ID}.{field}");
            tracing::warn!(
                setting = %setting,
                error = %error,
                "テンプレートのフォーマットに失敗したため、未加工のまま使用します"
            );
        }
        formatted.into_text()
    }

    fn render(&self, template: &str, params: &TemplateParams) -> Result<String, FormatError> {
        let mut rendered = String::with_capacity(template.len());
        let mut last = 0;

        for captures in self.token.captures_iter(template) {
            let Some(token) = captures.get(0) else {
                continue;
            };
            rendered.push_str(&template[last..token.start()]);

            match (captures.get(1), captures.get(2)) {
                (Some(root), rest) => {
                    let rest = rest.map_or("", |m| m.as_str());
                    rendered.push_str(&self.render_field(root.as_str(), rest, params)?);
                }
                _ if token.as_str() == "}}" => rendered.push('}'),
                _ => {
                    return Err(FormatError::UnbalancedBrace {
                        position: token.start(),
                    });
                }
            }
            last = token.end();
        }

        rendered.push_str(&template[last..]);
        Ok(rendered)
    }

    /// `root` に続く `.attr` / `!conv` / `:spec` を解釈して 1 フィールドを描画する
    fn render_field(
        &self,
        root: &str,
        rest: &str,
        params: &TemplateParams,
    ) -> Result<String, FormatError> {
        let (chain, tail) = rest.split_at(rest.find(['!', ':']).unwrap_or(rest.len()));
        let value = resolve_attributes(root, chain, params)?;

        let (conversion, spec) = match tail.strip_prefix('!') {
            Some(after) => {
                let mut chars = after.chars();
                let conversion = chars
                    .next()
                    .ok_or_else(|| FormatError::InvalidConversion(String::new()))?;
                let remainder = chars.as_str();
                let spec = if remainder.is_empty() {
                    ""
                } else {
                    remainder
                        .strip_prefix(':')
                        .ok_or_else(|| FormatError::InvalidConversion(after.to_string()))?
                };
                (Some(conversion), spec)
            }
            None => (None, tail.strip_prefix(':').unwrap_or_default()),
        };

        let text = match conversion {
            None | Some('s') => value.to_string(),
            Some('r') => represent(value),
            Some(other) => return Err(FormatError::InvalidConversion(other.to_string())),
        };
        Ok(self.parse_spec(spec)?.apply(&text))
    }

    fn parse_spec(&self, spec: &str) -> Result<FormatSpec, FormatError> {
        if spec.is_empty() {
            return Ok(FormatSpec::default());
        }
        let invalid = || FormatError::InvalidFormatSpec(spec.to_string());
        let captures = self.spec.captures(spec).ok_or_else(invalid)?;

        let number = |name: &str| -> Result<Option<usize>, FormatError> {
            captures
                .name(name)
                .map(|m| m.as_str().parse::<usize>().map_err(|_| invalid()))
                .transpose()
        };
        let align = match captures.name("align").map(|m| m.as_str()) {
            Some(">") => Align::Right,
            Some("^") => Align::Center,
            _ => Align::Left,
        };
        let fill = match captures.name("fill") {
            Some(m) => m.as_str().chars().next().unwrap_or(' '),
            None if captures.name("zero").is_some() && captures.name("align").is_none() => '0',
            None => ' ',
        };

        Ok(FormatSpec {
            fill,
            align,
            width: number("width")?,
            precision: number("precision")?,
        })
    }
}

/// `root` から `.attr.attr` をたどる
fn resolve_attributes<'p>(
    root: &str,
    chain: &str,
    params: &'p TemplateParams,
) -> Result<&'p TemplateValue, FormatError> {
    let mut value = params.resolve(root);
    if chain.is_empty() {
        return Ok(value);
    }
    let attributes = chain
        .strip_prefix('.')
        .ok_or_else(|| FormatError::InvalidField(format!("{root}{chain}")))?;

    let mut path = root.to_string();
    for attribute in attributes.split('.') {
        if attribute.is_empty() || attribute.contains(['[', ']']) {
            return Err(FormatError::InvalidField(format!("{root}{chain}")));
        }
        value = value
            .attribute(attribute)
            .ok_or_else(|| FormatError::MissingAttribute {
                path:      path.clone(),
                attribute: attribute.to_string(),
            })?;
        path.push('.');
        path.push_str(attribute);
    }

    Ok(value)
}

/// `!r` の表現
///
/// テキストは引用符で囲み、オブジェクトは表示文字列をそのまま使う。
fn represent(value: &TemplateValue) -> String {
    let TemplateValue::Text(text) = value else {
        return value.to_string();
    };
    let quote = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push(quote);
    for c in text.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c == quote => {
                quoted.push('\\');
                quoted.push(c);
            }
            c if c.is_control() => quoted.push_str(&format!("\\x{:02x}", u32::from(c))),
            c => quoted.push(c),
        }
    }
    quoted.push(quote);
    quoted
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FormatSpec {
    fill:      char,
    align:     Align,
    width:     Option<usize>,
    precision: Option<usize>,
}

impl Default for FormatSpec {
    fn default() -> Self {
        Self {
            fill:      ' ',
            align:     Align::Left,
            width:     None,
            precision: None,
        }
    }
}

impl FormatSpec {
    fn apply(&self, text: &str) -> String {
        let truncated: String = match self.precision {
            Some(precision) => text.chars().take(precision).collect(),
            None => text.to_string(),
        };
        let length = truncated.chars().count();
        let Some(padding) = self.width.and_then(|w| w.checked_sub(length)) else {
            return truncated;
        };

        let (left, right) = match self.align {
            Align::Left => (0, padding),
            Align::Right => (padding, 0),
            Align::Center => (padding / 2, padding - padding / 2),
        };
        let fill = |n: usize| std::iter::repeat_n(self.fill, n);
        fill(left).chain(truncated.chars()).chain(fill(right)).collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use statemail_domain::template::TemplateObject;

    use super::*;

    fn params() -> TemplateParams {
        let obj = TemplateObject::new("<Workspace at /plone/workspace/test>")
            .with_text("id", "test")
            .with_text("portal_type", "Workspace");
        let transition = TemplateObject::new("publish").with_text("new_state_id", "published");
        let event = TemplateObject::new("<TransitionEvent publish>")
            .with_attribute("transition", transition.into());

        let mut params = TemplateParams::new();
        params.insert(TemplateParams::OBJ, obj.into());
        params.insert(TemplateParams::EVENT, event.into());
        params.insert(TemplateParams::PORTAL_URL, TemplateValue::text("http://nohost/plone"));
        params.insert(TemplateParams::TITLE_OR_ID, TemplateValue::text("Cake title"));
        params
    }

    fn sut() -> TemplateFormatter {
        TemplateFormatter::new().unwrap()
    }

    #[rstest]
    #[case("plain text", "plain text")]
    #[case("{portal_url}", "http://nohost/plone")]
    #[case("{obj.id} is now {event.transition.new_state_id}", "test is now published")]
    #[case("Item: ({not_exist})", "Item: ()")]
    #[case("a}}b {obj.id}", "a}b test")]
    #[case("{obj}", "<Workspace at /plone/workspace/test>")]
    #[case("{event.transition}", "publish")]
    #[case("", "")]
    fn test_プレースホルダーを置換する(#[case] template: &str, #[case] expected: &str) {
        let result = sut().format(template, &params());

        assert_eq!(result, Formatted::Rendered(expected.to_string()));
    }

    #[rstest]
    #[case("{obj.id:>6}", "  test")]
    #[case("{obj.id:<6}|", "test  |")]
    #[case("{obj.id:^7}", " test  ")]
    #[case("{obj.id:*^8}", "**test**")]
    #[case("{title_or_id:>12}|", "  Cake title|")]
    #[case("{portal_url:.4}", "http")]
    #[case("{obj.id:.0}", "")]
    #[case("{obj.id:s}", "test")]
    #[case("{obj.id:05}", "test0")]
    #[case("{obj.id:2}", "test")]
    #[case("{obj.id!s:>5}", " test")]
    #[case("{obj.id!r}", "'test'")]
    #[case("{not_exist!r}", "''")]
    #[case("{obj!r}", "<Workspace at /plone/workspace/test>")]
    #[case("{obj:>40}", "    <Workspace at /plone/workspace/test>")]
    fn test_変換指定と書式指定を適用する(#[case] template: &str, #[case] expected: &str) {
        let result = sut().format(template, &params());

        assert_eq!(result, Formatted::Rendered(expected.to_string()));
    }

    #[test]
    fn test_幅は文字数で数える() {
        let mut params = params();
        params.insert(TemplateParams::TITLE_OR_ID, TemplateValue::text("ケーキ"));

        let result = sut().format("[{title_or_id:>5}] [{title_or_id:.2}]", &params);

        assert_eq!(result.text(), "[  ケーキ] [ケー]");
    }

    #[test]
    fn test_reprは引用符とバックスラッシュをエスケープする() {
        let mut params = params();
        params.insert("single", TemplateValue::text("it's"));
        params.insert("both", TemplateValue::text("a\\'\"b"));

        let result = sut().format("{single!r} {both!r}", &params);

        assert_eq!(result.text(), "\"it's\" 'a\\\\\\'\"b'");
    }

    #[rstest]
    #[case("Item: not_exist}")]
    #[case("Item: {not_exist")]
    #[case("{obj.id}}")]
    #[case("{{literal}}")]
    #[case("{{literal}} {obj.id}")]
    #[case("{}")]
    #[case("{!r}")]
    #[case("{obj.}")]
    #[case("{obj-id}")]
    #[case("{obj[id]}")]
    #[case("{obj.id!x}")]
    #[case("{obj.id!}")]
    #[case("{obj.id!r5}")]
    #[case("{obj.id:+5}")]
    #[case("{obj.id:=5}")]
    #[case("{obj.id:,}")]
    #[case("{obj.id:d}")]
    #[case("{obj.id:.}")]
    #[case("{obj.id:{width}}")]
    #[case("{obj.not_attribute} is now {event.transition.new_state_id}")]
    #[case("{portal_url.scheme}")]
    #[case("{not_exist.attr}")]
    fn test_失敗時はテンプレートをそのまま返す(#[case] template: &str) {
        let result = sut().format(template, &params());

        assert!(result.is_fallback());
        assert_eq!(result.text(), template);
    }

    #[test]
    fn test_同じテンプレートとパラメータは同じ結果になる() {
        let sut = sut();
        let params = params();

        let first = sut.format("{obj.portal_type} `{obj.id}`", &params);
        let second = sut.format("{obj.portal_type} `{obj.id}`", &params);

        assert_eq!(first, second);
    }

    #[test]
    fn test_単独の閉じ括弧は位置を報告する() {
        let result = sut().format("Item: not_exist}", &params());

        assert_eq!(
            result.error(),
            Some(&FormatError::UnbalancedBrace { position: 15 })
        );
    }

    #[test]
    fn test_二重の開き括弧はエスケープとして扱わない() {
        let result = sut().format("{{literal}}", &params());

        assert_eq!(
            result.error(),
            Some(&FormatError::UnbalancedBrace { position: 0 })
        );
    }

    #[rstest]
    #[case("{obj.id!x}", FormatError::InvalidConversion("x".to_string()))]
    #[case("{obj.id:+5}", FormatError::InvalidFormatSpec("+5".to_string()))]
    fn test_変換指定と書式指定の失敗理由(#[case] template: &str, #[case] expected: FormatError) {
        let result = sut().format(template, &params());

        assert_eq!(result.error(), Some(&expected));
    }

    #[test]
    fn test_存在しない属性はパスを報告する() {
        let result = sut().format("{event.transition.missing}", &params());

        assert_eq!(
            result.error(),
            Some(&FormatError::MissingAttribute {
                path:      "event.transition".to_string(),
                attribute: "missing".to_string(),
            })
        );
    }

    #[test]
    fn test_遷移のないイベントの遷移先参照は失敗する() {
        let mut params = TemplateParams::new();
        params.insert(
            TemplateParams::EVENT,
            TemplateObject::new("<TransitionEvent>").into(),
        );

        let result = sut().format("{event.transition.new_state_id}", &params);

        assert!(result.is_fallback());
    }

    #[test]
    fn test_format_settingは失敗時に未加工のテンプレートを返す() {
        let settings = NotificationSettings::default()
            .with_subject_template("Item: not_exist}")
            .with_message_template("{obj.id:>6} here");

        let subject = sut().format_setting(&settings, TemplateField::SubjectTemplate, &params());
        let message = sut().format_setting(&settings, TemplateField::MessageTemplate, &params());

        assert_eq!(subject, "Item: not_exist}");
        assert_eq!(message, "  test here");
    }
}
