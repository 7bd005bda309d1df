// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Formats the preference store into the memory digest fed to prompts.

use linq_core::PreferenceFact;

use crate::miner::USER_NAME_KEY;

/// Returned by [`render`] when there are no facts. Callers compare against
/// it to leave the memory block out of a prompt.
pub const NO_PREFERENCES: &str = "目前还没有记录任何用户偏好信息。";

const DIGEST_HEADER: &str = "以下是你已知的关于用户的信息：";

/// Key for the assistant's own name, set by imports or the front-end.
pub const AI_NAME_KEY: &str = "ai_name";

/// How a single fact is phrased in the digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phrasing {
    UserName,
    AiName,
    Like,
    Hobby,
    Generic,
}

impl Phrasing {
    pub fn of(fact: &PreferenceFact) -> Self {
        match (fact.category.as_str(), fact.key.as_str()) {
            ("fact", USER_NAME_KEY) => Phrasing::UserName,
            ("fact", AI_NAME_KEY) => Phrasing::AiName,
            ("like", _) => Phrasing::Like,
            ("hobby", _) => Phrasing::Hobby,
            _ => Phrasing::Generic,
        }
    }

    /// One line of text, without the bullet.
    ///
    /// For `Like` and `Hobby` the stored value is the trigger keyword and
    /// the key is the object, so the value is written first.
    pub fn phrase(self, fact: &PreferenceFact) -> String {
        let (key, value) = (&fact.key, &fact.value);
        match self {
            Phrasing::UserName => format!("用户的名字叫{value}"),
            Phrasing::AiName => format!("你（AI）的名字是{value}"),
            Phrasing::Like | Phrasing::Hobby => format!("用户{value}{key}"),
            Phrasing::Generic => format!("用户的{key}是{value}"),
        }
    }
}

/// Render `facts` in the given order. Pure: the same input always yields
/// byte-identical output.
pub fn render(facts: &[PreferenceFact]) -> String {
    if facts.is_empty() {
        return NO_PREFERENCES.to_string();
    }
    let mut out = String::from(DIGEST_HEADER);
    out.push('\n');
    for fact in facts {
        out.push_str("- ");
        out.push_str(&Phrasing::of(fact).phrase(fact));
        out.push('\n');
    }
    out
}

/// `None` for the empty sentinel, otherwise the digest.
pub fn digest_or_none(facts: &[PreferenceFact]) -> Option<String> {
    let text = render(facts);
    (text != NO_PREFERENCES).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact(category: &str, key: &str, value: &str) -> PreferenceFact {
        PreferenceFact {
            id: 0,
            category: category.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            source_turn_id: None,
        }
    }

    #[test]
    fn empty_input_renders_sentinel() {
        assert_eq!(render(&[]), NO_PREFERENCES);
        assert_eq!(digest_or_none(&[]), None);
    }

    #[test]
    fn phrasing_per_category() {
        let facts = vec![
            fact("fact", "user_name", "小明"),
            fact("fact", "ai_name", "小助"),
            fact("like", "篮球", "喜欢"),
            fact("hobby", "跑步", "经常"),
            fact("fact", "计算机", "我学"),
            fact("custom", "城市", "上海"),
        ];
        let text = render(&facts);
        let expected = "以下是你已知的关于用户的信息：\n\
                        - 用户的名字叫小明\n\
                        - 你（AI）的名字是小助\n\
                        - 用户喜欢篮球\n\
                        - 用户经常跑步\n\
                        - 用户的计算机是我学\n\
                        - 用户的城市是上海\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn user_name_outside_fact_category_is_generic() {
        assert_eq!(Phrasing::of(&fact("like", "user_name", "x")), Phrasing::Like);
        assert_eq!(Phrasing::of(&fact("other", "user_name", "x")), Phrasing::Generic);
    }

    #[test]
    fn rendering_is_deterministic() {
        let facts = vec![fact("like", "猫", "爱"), fact("hobby", "早起", "习惯")];
        assert_eq!(render(&facts), render(&facts.clone()));
        assert!(digest_or_none(&facts).unwrap().starts_with(DIGEST_HEADER));
    }
}
