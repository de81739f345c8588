//! Label template mini-language.
//!
//! | Placeholder | Expands to |
//! |-------------|------------|
//! | `$L` | reader label |
//! | `$M` | chart maximum |
//! | `$I` | seconds between the last two samples |
//! | `$0`..`$9`, `$a`..`$z` | the n-th configured value |
//! | `$S0`, `$Sa`, ... | the same value, auto-scaled |
//!
//! Anything else, including a value index the reader does not have, is
//! copied through unchanged.

/// Template used when a reader has none configured
pub const DEFAULT_TEMPLATE: &str = "$L $0";

/// One element of a parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Literal(String),
    Label,
    Max,
    Interval,
    Value {
        index: usize,
        scaled: bool,
        /// Source text, emitted when the value does not exist
        raw: String,
    },
}

/// A template parsed once into tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    tokens: Vec<Token>,
}

fn value_index(c: char) -> Option<usize> {
    match c {
        '0'..='9' => Some(c as usize - '0' as usize),
        'a'..='z' => Some(10 + c as usize - 'a' as usize),
        _ => None,
    }
}

impl Template {
    pub fn parse(source: &str) -> Self {
        let source = if source.is_empty() {
            DEFAULT_TEMPLATE
        } else {
            source
        };

        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '$' {
                literal.push(c);
                continue;
            }

            let token = match chars.peek().copied() {
                Some('L') => Some(Token::Label),
                Some('M') => Some(Token::Max),
                Some('I') => Some(Token::Interval),
                Some('S') => {
                    let mut lookahead = chars.clone();
                    lookahead.next();
                    match lookahead.peek().copied().and_then(|n| value_index(n).map(|i| (n, i))) {
                        Some((n, index)) => {
                            chars.next();
                            Some(Token::Value {
                                index,
                                scaled: true,
                                raw: format!("$S{}", n),
                            })
                        }
                        None => None,
                    }
                }
                Some(n) => value_index(n).map(|index| Token::Value {
                    index,
                    scaled: false,
                    raw: format!("${}", n),
                }),
                None => None,
            };

            match token {
                Some(token) => {
                    chars.next();
                    if !literal.is_empty() {
                        tokens.push(Token::Literal(std::mem::take(&mut literal)));
                    }
                    tokens.push(token);
                }
                None => literal.push('$'),
            }
        }
        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }

        Self {
            source: source.to_string(),
            tokens,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::parse(DEFAULT_TEMPLATE)
    }
}

/// Output buffer with a hard character budget
///
/// Each push is charged against the budget; whatever does not fit is cut
/// at a character boundary and later pushes are ignored.
#[derive(Debug)]
pub struct Budget {
    out: String,
    remaining: usize,
}

impl Budget {
    pub fn new(limit: usize) -> Self {
        Self {
            out: String::new(),
            remaining: limit,
        }
    }

    /// Append as much of `text` as fits. Returns false once the budget is spent.
    pub fn push(&mut self, text: &str) -> bool {
        for c in text.chars() {
            if self.remaining == 0 {
                return false;
            }
            self.out.push(c);
            self.remaining -= 1;
        }
        self.remaining > 0
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn finish(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_placeholders() {
        let template = Template::parse("$L: $0/$S1 max $M every $Is");
        assert_eq!(
            template.tokens(),
            &[
                Token::Label,
                Token::Literal(": ".to_string()),
                Token::Value {
                    index: 0,
                    scaled: false,
                    raw: "$0".to_string()
                },
                Token::Literal("/".to_string()),
                Token::Value {
                    index: 1,
                    scaled: true,
                    raw: "$S1".to_string()
                },
                Token::Literal(" max ".to_string()),
                Token::Max,
                Token::Literal(" every ".to_string()),
                Token::Interval,
                Token::Literal("s".to_string()),
            ]
        );
    }

    #[test]
    fn test_letter_indices() {
        let template = Template::parse("$a$z");
        let indices: Vec<usize> = template
            .tokens()
            .iter()
            .filter_map(|t| match t {
                Token::Value { index, .. } => Some(*index),
                _ => None,
            })
            .collect();
        assert_eq!(indices, vec![10, 35]);
    }

    #[test]
    fn test_unknown_placeholders_pass_through() {
        let template = Template::parse("100$ $X $S! $");
        assert_eq!(
            template.tokens(),
            &[Token::Literal("100$ $X $S! $".to_string())]
        );
    }

    #[test]
    fn test_empty_template_uses_default() {
        assert_eq!(Template::parse(""), Template::default());
        assert_eq!(Template::parse("").source(), "$L $0");
    }

    #[test]
    fn test_budget_cuts_on_char_boundary() {
        let mut budget = Budget::new(4);
        assert!(budget.push("ab"));
        assert!(!budget.push("çdé"));
        assert!(!budget.push("more"));
        assert_eq!(budget.finish(), "abçd");
    }
}
