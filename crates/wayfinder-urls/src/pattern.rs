//! Express-style path patterns.
//!
//! A pattern such as `/users/:id(\d+)?` is tokenized into literal text and
//! parameter descriptors, then compiled in two directions:
//!
//! - [`CompiledPattern`]: a regular expression with one capture group per
//!   parameter, anchored according to [`PatternOptions`].
//! - [`PathBuilder`]: substitutes parameter values back into the token list,
//!   validating every value against its parameter's own pattern.
//!
//! # Syntax
//!
//! - `:name` - named parameter matching one segment
//! - `:name(regex)` - named parameter with a custom pattern
//! - `(regex)` - unnamed parameter, keyed by position
//! - `?`, `*`, `+` after a parameter - optional, zero or more, one or more
//! - `{prefix:name suffix}` - group text with a parameter atomically
//! - `\x` - escaped literal character

use crate::error::{BuildError, PatternError};
use crate::params::{ParamValue, Params};
use regex::{Regex, RegexBuilder};
use std::fmt;

/// Characters that terminate a parameter segment by default.
pub const DEFAULT_DELIMITER: &str = "/#?";

/// Characters that become a parameter prefix when written right before it.
pub const DEFAULT_PREFIXES: &str = "./";

/// Maximum allowed length for a pattern string in bytes.
const MAX_PATTERN_LENGTH: usize = 1024;

/// Maximum allowed size for a compiled pattern regex (in bytes).
const MAX_REGEX_SIZE: usize = 1 << 20; // 1 MiB

/// Options controlling tokenization and regex anchoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternOptions {
	/// Match case-sensitively.
	pub sensitive: bool,
	/// Disallow an optional trailing delimiter.
	pub strict: bool,
	/// Anchor the match at the start of the input.
	pub start: bool,
	/// Require the pattern to consume the whole input.
	pub end: bool,
	/// Characters a default parameter may not contain.
	pub delimiter: String,
	/// Characters treated as parameter prefixes.
	pub prefixes: String,
}

impl Default for PatternOptions {
	fn default() -> Self {
		Self {
			sensitive: false,
			strict: false,
			start: true,
			end: true,
			delimiter: DEFAULT_DELIMITER.to_string(),
			prefixes: DEFAULT_PREFIXES.to_string(),
		}
	}
}

impl PatternOptions {
	/// Sets case sensitivity.
	pub fn sensitive(mut self, sensitive: bool) -> Self {
		self.sensitive = sensitive;
		self
	}

	/// Sets strict trailing-delimiter handling.
	pub fn strict(mut self, strict: bool) -> Self {
		self.strict = strict;
		self
	}

	/// Sets start anchoring.
	pub fn start(mut self, start: bool) -> Self {
		self.start = start;
		self
	}

	/// Sets end anchoring.
	pub fn end(mut self, end: bool) -> Self {
		self.end = end;
		self
	}
}

/// Repetition modifier of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
	/// Exactly once.
	None,
	/// `?`
	Optional,
	/// `*`
	ZeroOrMore,
	/// `+`
	OneOrMore,
}

impl Modifier {
	fn parse(value: Option<String>) -> Self {
		match value.as_deref() {
			Some("?") => Self::Optional,
			Some("*") => Self::ZeroOrMore,
			Some("+") => Self::OneOrMore,
			_ => Self::None,
		}
	}

	/// Whether the parameter may be omitted.
	pub fn is_optional(self) -> bool {
		matches!(self, Self::Optional | Self::ZeroOrMore)
	}

	/// Whether the parameter may capture several segments.
	pub fn is_repeat(self) -> bool {
		matches!(self, Self::ZeroOrMore | Self::OneOrMore)
	}

	/// Regex quantifier text for the modifier.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::None => "",
			Self::Optional => "?",
			Self::ZeroOrMore => "*",
			Self::OneOrMore => "+",
		}
	}
}

/// Name of a parameter: explicit, or the position of an unnamed group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamName {
	/// `:name`
	Named(String),
	/// Unnamed `(regex)` group.
	Index(usize),
}

impl fmt::Display for ParamName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Named(name) => write!(f, "{}", name),
			Self::Index(index) => write!(f, "{}", index),
		}
	}
}

/// Descriptor of one parameter in a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamKey {
	/// Parameter name.
	pub name: ParamName,
	/// Text emitted before the value.
	pub prefix: String,
	/// Text emitted after the value.
	pub suffix: String,
	/// Regex source a value must match.
	pub pattern: String,
	/// Repetition modifier.
	pub modifier: Modifier,
}

/// A parsed pattern token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
	/// Literal text.
	Literal(String),
	/// Parameter segment.
	Param(ParamKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexKind {
	Modifier,
	EscapedChar,
	Open,
	Close,
	Name,
	Pattern,
	Char,
	End,
}

impl LexKind {
	fn as_str(self) -> &'static str {
		match self {
			Self::Modifier => "MODIFIER",
			Self::EscapedChar => "ESCAPED_CHAR",
			Self::Open => "OPEN",
			Self::Close => "CLOSE",
			Self::Name => "NAME",
			Self::Pattern => "PATTERN",
			Self::Char => "CHAR",
			Self::End => "END",
		}
	}
}

#[derive(Debug, Clone)]
struct LexToken {
	kind: LexKind,
	index: usize,
	value: String,
}

fn lex(input: &str) -> Result<Vec<LexToken>, PatternError> {
	let chars: Vec<char> = input.chars().collect();
	let mut tokens = Vec::new();
	let mut i = 0;

	let token = |kind, index, value: String| LexToken { kind, index, value };

	while i < chars.len() {
		let c = chars[i];
		match c {
			'*' | '+' | '?' => {
				tokens.push(token(LexKind::Modifier, i, c.to_string()));
				i += 1;
			}
			'\\' => {
				let Some(escaped) = chars.get(i + 1) else {
					return Err(PatternError::UnexpectedToken {
						found: LexKind::EscapedChar.as_str(),
						index: i,
						expected: LexKind::End.as_str(),
					});
				};
				tokens.push(token(LexKind::EscapedChar, i, escaped.to_string()));
				i += 2;
			}
			'{' => {
				tokens.push(token(LexKind::Open, i, c.to_string()));
				i += 1;
			}
			'}' => {
				tokens.push(token(LexKind::Close, i, c.to_string()));
				i += 1;
			}
			':' => {
				let name: String = chars[i + 1..]
					.iter()
					.take_while(|ch| ch.is_ascii_alphanumeric() || **ch == '_')
					.collect();
				if name.is_empty() {
					return Err(PatternError::MissingParameterName(i));
				}
				let next = i + 1 + name.chars().count();
				tokens.push(token(LexKind::Name, i, name));
				i = next;
			}
			'(' => {
				let mut count = 1usize;
				let mut pattern = String::new();
				let mut j = i + 1;

				if chars.get(j) == Some(&'?') {
					return Err(PatternError::PatternStartsWithModifier(j));
				}

				while j < chars.len() {
					if chars[j] == '\\' {
						pattern.push(chars[j]);
						if let Some(next) = chars.get(j + 1) {
							pattern.push(*next);
						}
						j += 2;
						continue;
					}

					if chars[j] == ')' {
						count -= 1;
						if count == 0 {
							j += 1;
							break;
						}
					} else if chars[j] == '(' {
						count += 1;
						if chars.get(j + 1) != Some(&'?') {
							return Err(PatternError::CapturingGroup(j));
						}
					}

					pattern.push(chars[j]);
					j += 1;
				}

				if count != 0 {
					return Err(PatternError::UnbalancedPattern(i));
				}
				if pattern.is_empty() {
					return Err(PatternError::MissingPattern(i));
				}

				tokens.push(token(LexKind::Pattern, i, pattern));
				i = j;
			}
			_ => {
				tokens.push(token(LexKind::Char, i, c.to_string()));
				i += 1;
			}
		}
	}

	tokens.push(token(LexKind::End, i, String::new()));
	Ok(tokens)
}

struct Parser<'a> {
	tokens: Vec<LexToken>,
	pos: usize,
	options: &'a PatternOptions,
	result: Vec<Token>,
	next_index: usize,
}

impl<'a> Parser<'a> {
	fn try_consume(&mut self, kind: LexKind) -> Option<String> {
		match self.tokens.get(self.pos) {
			Some(token) if token.kind == kind => {
				self.pos += 1;
				Some(token.value.clone())
			}
			_ => None,
		}
	}

	fn must_consume(&mut self, kind: LexKind) -> Result<String, PatternError> {
		if let Some(value) = self.try_consume(kind) {
			return Ok(value);
		}
		let (found, index) = self
			.tokens
			.get(self.pos)
			.map(|token| (token.kind.as_str(), token.index))
			.unwrap_or((LexKind::End.as_str(), 0));
		Err(PatternError::UnexpectedToken {
			found,
			index,
			expected: kind.as_str(),
		})
	}

	fn consume_text(&mut self) -> String {
		let mut text = String::new();
		while let Some(value) = self
			.try_consume(LexKind::Char)
			.or_else(|| self.try_consume(LexKind::EscapedChar))
		{
			text.push_str(&value);
		}
		text
	}

	fn next_unnamed(&mut self) -> ParamName {
		let name = ParamName::Index(self.next_index);
		self.next_index += 1;
		name
	}

	/// Default pattern for a parameter without an explicit one.
	///
	/// The value may not contain a delimiter, nor the text that precedes the
	/// parameter when that text is a single non-delimiter character.
	///
	/// Longer preceding text is not excluded: `regex` has no lookahead to
	/// forbid a substring. The lazy quantifier makes earlier parameters as
	/// short as possible, so a repeated separator lands in the later value:
	/// `/:from-to-:to` matches `/x-to-y-to-z` with `from = x` and
	/// `to = y-to-z`, where a lookahead-based matcher would give
	/// `from = x-to-y` and `to = z`.
	fn safe_pattern(&self, prefix: &str) -> Result<String, PatternError> {
		let prev = self.result.last();
		let prev_text = if !prefix.is_empty() {
			prefix.to_string()
		} else {
			match prev {
				Some(Token::Literal(text)) => text.clone(),
				_ => String::new(),
			}
		};

		if let Some(Token::Param(key)) = prev {
			if prev_text.is_empty() {
				return Err(PatternError::MissingTextBetweenParameters(
					key.name.to_string(),
				));
			}
		}

		let delimiter = regex::escape(&self.options.delimiter);
		let is_safe = prev_text
			.chars()
			.any(|c| self.options.delimiter.contains(c));
		// Multi-character text falls back to the plain segment pattern.
		if prev_text.is_empty() || is_safe || prev_text.chars().count() > 1 {
			return Ok(format!("[^{}]+?", delimiter));
		}
		Ok(format!("[^{}{}]+?", delimiter, regex::escape(&prev_text)))
	}

	fn parse(mut self) -> Result<Vec<Token>, PatternError> {
		let mut path = String::new();

		while self.pos < self.tokens.len() {
			let ch = self.try_consume(LexKind::Char);
			let name = self.try_consume(LexKind::Name);
			let pattern = self.try_consume(LexKind::Pattern);

			if name.is_some() || pattern.is_some() {
				let mut prefix = ch.unwrap_or_default();
				if !self.options.prefixes.contains(prefix.as_str()) {
					path.push_str(&prefix);
					prefix.clear();
				}

				if !path.is_empty() {
					self.result.push(Token::Literal(std::mem::take(&mut path)));
				}

				let name = match name {
					Some(name) => ParamName::Named(name),
					None => self.next_unnamed(),
				};
				let pattern = match pattern {
					Some(pattern) => pattern,
					None => self.safe_pattern(&prefix)?,
				};
				let modifier = Modifier::parse(self.try_consume(LexKind::Modifier));

				self.result.push(Token::Param(ParamKey {
					name,
					prefix,
					suffix: String::new(),
					pattern,
					modifier,
				}));
				continue;
			}

			if let Some(value) = ch.or_else(|| self.try_consume(LexKind::EscapedChar)) {
				path.push_str(&value);
				continue;
			}

			if !path.is_empty() {
				self.result.push(Token::Literal(std::mem::take(&mut path)));
			}

			if self.try_consume(LexKind::Open).is_some() {
				let prefix = self.consume_text();
				let name = self.try_consume(LexKind::Name).unwrap_or_default();
				let pattern = self.try_consume(LexKind::Pattern).unwrap_or_default();
				let suffix = self.consume_text();

				self.must_consume(LexKind::Close)?;

				let param_name = if !name.is_empty() {
					ParamName::Named(name.clone())
				} else if !pattern.is_empty() {
					self.next_unnamed()
				} else {
					ParamName::Named(String::new())
				};
				let pattern = if !name.is_empty() && pattern.is_empty() {
					self.safe_pattern(&prefix)?
				} else {
					pattern
				};
				let modifier = Modifier::parse(self.try_consume(LexKind::Modifier));

				self.result.push(Token::Param(ParamKey {
					name: param_name,
					prefix,
					suffix,
					pattern,
					modifier,
				}));
				continue;
			}

			self.must_consume(LexKind::End)?;
		}

		Ok(self.result)
	}
}

/// Parses a pattern into literal and parameter tokens.
pub fn parse(pattern: &str, options: &PatternOptions) -> Result<Vec<Token>, PatternError> {
	if pattern.len() > MAX_PATTERN_LENGTH {
		return Err(PatternError::TooLong {
			length: pattern.len(),
			max: MAX_PATTERN_LENGTH,
		});
	}

	Parser {
		tokens: lex(pattern)?,
		pos: 0,
		options,
		result: Vec::new(),
		next_index: 0,
	}
	.parse()
}

/// Builds the regex source for a token list.
///
/// Group 1 always spans the consumed path; parameter groups follow in key
/// order. When a non-end pattern must be followed by a delimiter, the
/// delimiter is matched after group 1 instead of through a lookahead.
fn tokens_to_regex(
	tokens: &[Token],
	options: &PatternOptions,
) -> Result<(String, Vec<ParamKey>), PatternError> {
	let delimiter = format!("[{}]", regex::escape(&options.delimiter));
	let mut body = String::new();
	let mut keys = Vec::new();

	for token in tokens {
		match token {
			Token::Literal(text) => body.push_str(&regex::escape(text)),
			Token::Param(key) => {
				let prefix = regex::escape(&key.prefix);
				let suffix = regex::escape(&key.suffix);
				let pattern = &key.pattern;

				if pattern.is_empty() {
					body.push_str(&format!(
						"(?:{}{}){}",
						prefix,
						suffix,
						key.modifier.as_str()
					));
					continue;
				}

				keys.push(key.clone());

				if !prefix.is_empty() || !suffix.is_empty() {
					if key.modifier.is_repeat() {
						let quantifier = if key.modifier == Modifier::ZeroOrMore {
							"?"
						} else {
							""
						};
						body.push_str(&format!(
							"(?:{prefix}((?:{pattern})(?:{suffix}{prefix}(?:{pattern}))*){suffix}){quantifier}"
						));
					} else {
						body.push_str(&format!(
							"(?:{prefix}({pattern}){suffix}){}",
							key.modifier.as_str()
						));
					}
				} else {
					if key.modifier.is_repeat() {
						return Err(PatternError::RepeatWithoutAffix(key.name.to_string()));
					}
					body.push_str(&format!("({pattern}){}", key.modifier.as_str()));
				}
			}
		}
	}

	let mut tail = String::new();
	if options.end {
		if !options.strict {
			body.push_str(&format!("{}?", delimiter));
		}
		body.push('$');
	} else {
		let is_end_delimited = match tokens.last() {
			Some(Token::Literal(text)) => text
				.chars()
				.last()
				.is_some_and(|c| options.delimiter.contains(c)),
			Some(Token::Param(_)) => false,
			None => true,
		};
		if !options.strict {
			body.push_str(&format!("(?:{}$)?", delimiter));
		}
		if !is_end_delimited {
			tail = format!("(?:{}|$)", delimiter);
		}
	}

	let anchor = if options.start { "^" } else { "" };
	Ok((format!("{}({}){}", anchor, body, tail), keys))
}

fn build_regex(source: &str, sensitive: bool) -> Result<Regex, PatternError> {
	RegexBuilder::new(source)
		.case_insensitive(!sensitive)
		.size_limit(MAX_REGEX_SIZE)
		.build()
		.map_err(|e| PatternError::Regex(e.to_string()))
}

/// Raw result of executing a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
	/// Portion of the input consumed by the pattern.
	pub path: String,
	/// Captured value per key, `None` when the group did not participate.
	pub values: Vec<Option<String>>,
}

/// A pattern compiled to a regular expression.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
	pattern: String,
	regex: Regex,
	keys: Vec<ParamKey>,
}

impl CompiledPattern {
	/// Compiles `pattern` with the given options.
	pub fn new(pattern: &str, options: &PatternOptions) -> Result<Self, PatternError> {
		let tokens = parse(pattern, options)?;
		let (source, keys) = tokens_to_regex(&tokens, options)?;
		let regex = build_regex(&source, options.sensitive)?;

		Ok(Self {
			pattern: pattern.to_string(),
			regex,
			keys,
		})
	}

	/// Returns the original pattern string.
	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	/// Returns the generated regex source.
	pub fn regex_source(&self) -> &str {
		self.regex.as_str()
	}

	/// Returns the parameter descriptors in capture order.
	pub fn keys(&self) -> &[ParamKey] {
		&self.keys
	}

	/// Matches `path`, returning the consumed text and raw captures.
	pub fn exec(&self, path: &str) -> Option<PatternMatch> {
		let captures = self.regex.captures(path)?;
		let consumed = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
		let values = (0..self.keys.len())
			.map(|index| captures.get(index + 2).map(|m| m.as_str().to_string()))
			.collect();

		Some(PatternMatch {
			path: consumed.to_string(),
			values,
		})
	}

	/// Returns whether `path` matches.
	pub fn is_match(&self, path: &str) -> bool {
		self.regex.is_match(path)
	}
}

impl fmt::Display for CompiledPattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.pattern)
	}
}

impl PartialEq for CompiledPattern {
	fn eq(&self, other: &Self) -> bool {
		self.pattern == other.pattern && self.regex.as_str() == other.regex.as_str()
	}
}

/// How a path builder encodes substituted values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
	/// Insert values verbatim.
	#[default]
	Identity,
	/// Percent-encode values like `encodeURIComponent`.
	UriComponent,
}

impl Encoding {
	fn apply(self, value: &str) -> String {
		match self {
			Self::Identity => value.to_string(),
			Self::UriComponent => urlencoding::encode(value).into_owned(),
		}
	}
}

/// Substitutes parameter values into a pattern.
#[derive(Debug, Clone)]
pub struct PathBuilder {
	tokens: Vec<Token>,
	validators: Vec<Option<Regex>>,
	encoding: Encoding,
}

impl PathBuilder {
	/// Creates a builder from parsed tokens.
	pub fn from_tokens(
		tokens: Vec<Token>,
		encoding: Encoding,
		options: &PatternOptions,
	) -> Result<Self, PatternError> {
		let validators = tokens
			.iter()
			.map(|token| match token {
				Token::Literal(_) => Ok(None),
				Token::Param(key) => {
					build_regex(&format!("^(?:{})$", key.pattern), options.sensitive).map(Some)
				}
			})
			.collect::<Result<Vec<_>, _>>()?;

		Ok(Self {
			tokens,
			validators,
			encoding,
		})
	}

	/// Returns the tokens the builder substitutes into.
	pub fn tokens(&self) -> &[Token] {
		&self.tokens
	}

	/// Builds a concrete path from `params`.
	pub fn build(&self, params: &Params) -> Result<String, BuildError> {
		let mut path = String::new();

		for (token, validator) in self.tokens.iter().zip(&self.validators) {
			let key = match token {
				Token::Literal(text) => {
					path.push_str(text);
					continue;
				}
				Token::Param(key) => key,
			};
			let name = key.name.to_string();
			let is_valid = |segment: &str| validator.as_ref().is_none_or(|re| re.is_match(segment));

			match params.get(&name) {
				Some(ParamValue::Repeated(values)) => {
					if !key.modifier.is_repeat() {
						return Err(BuildError::UnexpectedRepeat(name));
					}
					if values.is_empty() {
						if key.modifier.is_optional() {
							continue;
						}
						return Err(BuildError::EmptyRepeat(name));
					}
					for value in values {
						let segment = self.encoding.apply(value);
						if !is_valid(&segment) {
							return Err(BuildError::RepeatMismatch {
								name,
								pattern: key.pattern.clone(),
								value: segment,
							});
						}
						path.push_str(&key.prefix);
						path.push_str(&segment);
						path.push_str(&key.suffix);
					}
				}
				Some(ParamValue::Single(value)) => {
					let segment = self.encoding.apply(value);
					if !is_valid(&segment) {
						return Err(BuildError::Mismatch {
							name,
							pattern: key.pattern.clone(),
							value: segment,
						});
					}
					path.push_str(&key.prefix);
					path.push_str(&segment);
					path.push_str(&key.suffix);
				}
				None => {
					if key.modifier.is_optional() {
						continue;
					}
					return Err(BuildError::Missing {
						name,
						repeat: key.modifier.is_repeat(),
					});
				}
			}
		}

		Ok(path)
	}
}

/// Compiles `pattern` into a path builder that inserts values verbatim.
pub fn compile(pattern: &str) -> Result<PathBuilder, PatternError> {
	let options = PatternOptions::default();
	PathBuilder::from_tokens(parse(pattern, &options)?, Encoding::Identity, &options)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn named(name: &str, prefix: &str, pattern: &str, modifier: Modifier) -> Token {
		Token::Param(ParamKey {
			name: ParamName::Named(name.to_string()),
			prefix: prefix.to_string(),
			suffix: String::new(),
			pattern: pattern.to_string(),
			modifier,
		})
	}

	const SEGMENT: &str = "[^/\\#\\?]+?";

	#[rstest]
	fn test_parse_named_parameter() {
		// Arrange
		let options = PatternOptions::default();

		// Act
		let tokens = parse("/users/:id", &options).unwrap();

		// Assert
		assert_eq!(
			tokens,
			vec![
				Token::Literal("/users".to_string()),
				named("id", "/", SEGMENT, Modifier::None),
			]
		);
	}

	#[rstest]
	fn test_parse_custom_and_unnamed_patterns() {
		let tokens = parse("/:id(\\d+)/(.*)", &PatternOptions::default()).unwrap();

		assert_eq!(
			tokens,
			vec![
				named("id", "/", "\\d+", Modifier::None),
				Token::Param(ParamKey {
					name: ParamName::Index(0),
					prefix: "/".to_string(),
					suffix: String::new(),
					pattern: ".*".to_string(),
					modifier: Modifier::None,
				}),
			]
		);
	}

	#[rstest]
	fn test_parse_braces_group_prefix_and_suffix() {
		let tokens = parse("/files{/:name.json}?", &PatternOptions::default()).unwrap();

		assert_eq!(
			tokens,
			vec![
				Token::Literal("/files".to_string()),
				Token::Param(ParamKey {
					name: ParamName::Named("name".to_string()),
					prefix: "/".to_string(),
					suffix: ".json".to_string(),
					pattern: SEGMENT.to_string(),
					modifier: Modifier::Optional,
				}),
			]
		);
	}

	#[rstest]
	fn test_non_prefix_character_stays_literal() {
		let tokens = parse(":from-:to", &PatternOptions::default()).unwrap();

		assert_eq!(
			tokens,
			vec![
				named("from", "", SEGMENT, Modifier::None),
				Token::Literal("-".to_string()),
				named("to", "", "[^/\\#\\?\\-]+?", Modifier::None),
			]
		);
	}

	#[rstest]
	fn test_repeated_multi_character_separator_goes_to_later_value() {
		// Arrange
		let pattern = CompiledPattern::new("/:from-to-:to", &PatternOptions::default()).unwrap();

		// Act
		let matched = pattern.exec("/x-to-y-to-z").unwrap();

		// Assert
		assert_eq!(
			matched.values,
			vec![Some("x".to_string()), Some("y-to-z".to_string())]
		);
	}

	#[rstest]
	#[case("/:", PatternError::MissingParameterName(1))]
	#[case("/(?x)", PatternError::PatternStartsWithModifier(2))]
	#[case("/(a(b))", PatternError::CapturingGroup(3))]
	#[case("/(abc", PatternError::UnbalancedPattern(1))]
	#[case("/()", PatternError::MissingPattern(1))]
	#[case("/:a:b", PatternError::MissingTextBetweenParameters("a".to_string()))]
	#[case("/{:a", PatternError::UnexpectedToken { found: "END", index: 4, expected: "CLOSE" })]
	#[case("/foo?", PatternError::UnexpectedToken { found: "MODIFIER", index: 4, expected: "END" })]
	#[case("/foo\\", PatternError::UnexpectedToken { found: "ESCAPED_CHAR", index: 4, expected: "END" })]
	fn test_malformed_patterns_are_rejected(#[case] pattern: &str, #[case] expected: PatternError) {
		let result = parse(pattern, &PatternOptions::default());

		assert_eq!(result, Err(expected));
	}

	#[rstest]
	fn test_repeat_without_affix_is_rejected() {
		let result = CompiledPattern::new(":path*", &PatternOptions::default());

		assert_eq!(
			result.map(|p| p.pattern().to_string()),
			Err(PatternError::RepeatWithoutAffix("path".to_string()))
		);
	}

	#[rstest]
	fn test_pattern_length_is_bounded() {
		let pattern = format!("/{}", "a".repeat(2000));

		let result = parse(&pattern, &PatternOptions::default());

		assert!(matches!(result, Err(PatternError::TooLong { .. })));
	}

	#[rstest]
	#[case("/users/42", true)]
	#[case("/users/42/", true)]
	#[case("/USERS/42", true)]
	#[case("/users", false)]
	#[case("/users/42/posts", false)]
	fn test_end_anchored_matching(#[case] path: &str, #[case] expected: bool) {
		let pattern = CompiledPattern::new("/users/:id", &PatternOptions::default()).unwrap();

		assert_eq!(pattern.is_match(path), expected);
	}

	#[rstest]
	fn test_exec_captures_value_and_consumed_path() {
		// Arrange
		let pattern = CompiledPattern::new("/users/:id", &PatternOptions::default()).unwrap();

		// Act
		let matched = pattern.exec("/users/42").unwrap();

		// Assert
		assert_eq!(matched.path, "/users/42");
		assert_eq!(matched.values, vec![Some("42".to_string())]);
	}

	#[rstest]
	#[case("/users/42/posts", Some("/users/42"))]
	#[case("/users/42/", Some("/users/42/"))]
	#[case("/users/42", Some("/users/42"))]
	#[case("/users/42x", Some("/users/42x"))]
	#[case("/usersx/42", None)]
	fn test_prefix_matching_consumes_segment(#[case] path: &str, #[case] consumed: Option<&str>) {
		let options = PatternOptions::default().end(false);
		let pattern = CompiledPattern::new("/users/:id", &options).unwrap();

		let matched = pattern.exec(path).map(|m| m.path);

		assert_eq!(matched.as_deref(), consumed);
	}

	#[rstest]
	fn test_literal_prefix_requires_segment_boundary() {
		let options = PatternOptions::default().end(false);
		let pattern = CompiledPattern::new("/users", &options).unwrap();

		assert_eq!(pattern.exec("/users/1").map(|m| m.path), Some("/users".to_string()));
		assert_eq!(pattern.exec("/usersx"), None);
	}

	#[rstest]
	fn test_empty_strict_pattern_consumes_nothing() {
		let options = PatternOptions::default().end(false).strict(true);
		let pattern = CompiledPattern::new("", &options).unwrap();

		let matched = pattern.exec("/anything").unwrap();

		assert_eq!(matched.path, "");
	}

	#[rstest]
	fn test_case_sensitive_option() {
		let options = PatternOptions::default().sensitive(true);
		let pattern = CompiledPattern::new("/About", &options).unwrap();

		assert!(pattern.is_match("/About"));
		assert!(!pattern.is_match("/about"));
	}

	#[rstest]
	fn test_repeated_parameter_capture() {
		let pattern = CompiledPattern::new("/files/:path+", &PatternOptions::default()).unwrap();

		let matched = pattern.exec("/files/a/b/c").unwrap();

		assert_eq!(matched.values, vec![Some("a/b/c".to_string())]);
		assert!(!pattern.is_match("/files"));
	}

	#[rstest]
	fn test_optional_parameter_may_be_absent() {
		let pattern = CompiledPattern::new("/posts/:slug?", &PatternOptions::default()).unwrap();

		let matched = pattern.exec("/posts").unwrap();

		assert_eq!(matched.values, vec![None]);
	}

	#[rstest]
	fn test_build_substitutes_values() {
		// Arrange
		let builder = compile("/users/:id/posts/:post").unwrap();
		let params = Params::new().with("id", 42).with("post", "hello");

		// Act
		let path = builder.build(&params).unwrap();

		// Assert
		assert_eq!(path, "/users/42/posts/hello");
	}

	#[rstest]
	fn test_build_requires_required_parameter() {
		let builder = compile("/users/:id").unwrap();

		let result = builder.build(&Params::new());

		assert_eq!(
			result,
			Err(BuildError::Missing {
				name: "id".to_string(),
				repeat: false
			})
		);
	}

	#[rstest]
	fn test_build_rejects_array_for_single_parameter() {
		let builder = compile("/users/:id").unwrap();

		let result = builder.build(&Params::new().with("id", vec!["1", "2"]));

		assert_eq!(result, Err(BuildError::UnexpectedRepeat("id".to_string())));
	}

	#[rstest]
	fn test_build_rejects_value_failing_own_pattern() {
		let builder = compile("/users/:id(\\d+)").unwrap();

		let result = builder.build(&Params::new().with("id", "abc"));

		assert_eq!(
			result,
			Err(BuildError::Mismatch {
				name: "id".to_string(),
				pattern: "\\d+".to_string(),
				value: "abc".to_string(),
			})
		);
	}

	#[rstest]
	fn test_build_rejects_delimiter_in_segment() {
		let builder = compile("/users/:id").unwrap();

		let result = builder.build(&Params::new().with("id", "a/b"));

		assert!(matches!(result, Err(BuildError::Mismatch { .. })));
	}

	#[rstest]
	#[case(Params::new(), "/files")]
	#[case(Params::new().with("path", Vec::<String>::new()), "/files")]
	#[case(Params::new().with("path", vec!["a", "b"]), "/files/a/b")]
	fn test_build_zero_or_more(#[case] params: Params, #[case] expected: &str) {
		let builder = compile("/files/:path*").unwrap();

		assert_eq!(builder.build(&params).unwrap(), expected);
	}

	#[rstest]
	fn test_build_one_or_more_rejects_empty_list() {
		let builder = compile("/files/:path+").unwrap();

		let result = builder.build(&Params::new().with("path", Vec::<String>::new()));

		assert_eq!(result, Err(BuildError::EmptyRepeat("path".to_string())));
	}

	#[rstest]
	fn test_build_with_uri_component_encoding() {
		let options = PatternOptions::default();
		let tokens = parse("/search/:term", &options).unwrap();
		let builder = PathBuilder::from_tokens(tokens, Encoding::UriComponent, &options).unwrap();

		let path = builder.build(&Params::new().with("term", "a b")).unwrap();

		assert_eq!(path, "/search/a%20b");
	}

	#[rstest]
	fn test_unnamed_parameters_are_keyed_by_position() {
		let builder = compile("/(\\d+)/(\\w+)").unwrap();

		let path = builder
			.build(&Params::new().with("0", 7).with("1", "seven"))
			.unwrap();

		assert_eq!(path, "/7/seven");
	}
}
