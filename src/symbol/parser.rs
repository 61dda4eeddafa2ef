//! Symbol URI grammar: a single left-to-right scan with no backtracking.
//!
//! ```text
//! <symbol>     ::= <scheme> ' ' <package> (' ' <descriptor>+)? | 'local ' <local-id>
//! <package>    ::= <manager> ' ' <name> ' ' <version>     ('.' means absent)
//! <descriptor> ::= '(' <ident> ')' | '[' <ident> ']'
//!                | <ident> ('/' | '#' | '.' | ':' | '!' | '(' <ident>? ').')
//! <ident>      ::= [A-Za-z0-9_+$-]+ | '`' ([^`] | '``')* '`'
//! ```
//!
//! Scheme and package fields escape a literal space by doubling it.
//! [`unparse`] is the exact inverse of [`parse_symbol`]: a backtick escape
//! around a name that needs none is rejected so that every accepted URI has
//! exactly one spelling.

use super::{Descriptor, LOCAL_SCHEME, Package, Suffix, Symbol};
use crate::error::{ParseResult, SymbolParseError};

/// Marker for an absent package field
const ABSENT: &str = ".";

/// True for a non-empty name made only of `[A-Za-z0-9_+$-]`
pub fn is_simple_identifier(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(is_simple_byte)
}

fn is_simple_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'+' | b'$' | b'-')
}

/// Parse a symbol URI into a [`Symbol`].
pub fn parse_symbol(uri: &str) -> ParseResult<Symbol> {
    SymbolParser::new(uri).parse()
}

/// Render a symbol back into its canonical URI.
pub fn unparse(symbol: &Symbol) -> String {
    let mut out = String::new();
    push_space_escaped(&mut out, symbol.scheme());

    if symbol.is_local() {
        out.push(' ');
        if let Some(local) = symbol.descriptors().first() {
            out.push_str(&local.name);
        }
        return out;
    }

    let package = symbol.package();
    for field in [&package.manager, &package.name, &package.version] {
        out.push(' ');
        if field.is_empty() {
            out.push_str(ABSENT);
        } else {
            push_space_escaped(&mut out, field);
        }
    }

    if !symbol.descriptors().is_empty() {
        out.push(' ');
    }
    for descriptor in symbol.descriptors() {
        push_descriptor(&mut out, descriptor);
    }
    out
}

fn push_space_escaped(out: &mut String, value: &str) {
    for c in value.chars() {
        if c == ' ' {
            out.push_str("  ");
        } else {
            out.push(c);
        }
    }
}

fn push_identifier(out: &mut String, name: &str) {
    if is_simple_identifier(name) {
        out.push_str(name);
    } else {
        out.push('`');
        out.push_str(&name.replace('`', "``"));
        out.push('`');
    }
}

fn push_descriptor(out: &mut String, descriptor: &Descriptor) {
    match descriptor.suffix {
        Suffix::Parameter => {
            out.push('(');
            push_identifier(out, &descriptor.name);
            out.push(')');
        }
        Suffix::TypeParameter => {
            out.push('[');
            push_identifier(out, &descriptor.name);
            out.push(']');
        }
        Suffix::Method => {
            push_identifier(out, &descriptor.name);
            out.push('(');
            if let Some(disambiguator) = descriptor.disambiguator.as_deref() {
                if !disambiguator.is_empty() {
                    push_identifier(out, disambiguator);
                }
            }
            out.push_str(").");
        }
        Suffix::Local => out.push_str(&descriptor.name),
        suffix => {
            push_identifier(out, &descriptor.name);
            out.push(match suffix {
                Suffix::Namespace => '/',
                Suffix::Type => '#',
                Suffix::Term => '.',
                Suffix::Meta => ':',
                _ => '!',
            });
        }
    }
}

struct SymbolParser<'a> {
    uri: &'a str,
    bytes: &'a [u8],
    index: usize,
    /// Whether the last space-escaped token ended at a separator
    separated: bool,
}

impl<'a> SymbolParser<'a> {
    fn new(uri: &'a str) -> Self {
        Self {
            uri,
            bytes: uri.as_bytes(),
            index: 0,
            separated: false,
        }
    }

    fn parse(mut self) -> ParseResult<Symbol> {
        let scheme = self.accept_space_escaped("scheme", true)?;

        if scheme == LOCAL_SCHEME {
            let id = &self.uri[self.index..];
            if id.is_empty() {
                return Err(self.error("unexpected end of input, expected a local identifier"));
            }
            return Ok(Symbol::from_parts(
                self.uri.to_string(),
                scheme,
                Package::default(),
                vec![Descriptor::new(id, Suffix::Local)],
            ));
        }

        let manager = self.accept_package_field("package manager", true)?;
        let name = self.accept_package_field("package name", true)?;
        let version = self.accept_package_field("package version", false)?;
        let package = Package {
            manager,
            name,
            version,
        };

        let mut descriptors = Vec::new();
        if self.separated && self.at_end() {
            return Err(self.error("unexpected end of input, expected a descriptor"));
        }
        while !self.at_end() {
            descriptors.push(self.accept_descriptor()?);
        }

        let symbol = Symbol::from_parts(self.uri.to_string(), scheme, package, descriptors);
        self.check_canonical(&symbol)?;
        Ok(symbol)
    }

    /// Every accepted URI must be the one [`unparse`] writes for it.
    fn check_canonical(&self, symbol: &Symbol) -> ParseResult<()> {
        let canonical = unparse(symbol);
        if canonical == self.uri {
            return Ok(());
        }
        let at = canonical
            .bytes()
            .zip(self.bytes)
            .position(|(a, b)| a != *b)
            .unwrap_or_else(|| canonical.len().min(self.bytes.len()));
        Err(self.error_at("non-canonical symbol spelling", at))
    }

    fn error(&self, message: impl Into<String>) -> SymbolParseError {
        self.error_at(message, self.index)
    }

    fn error_at(&self, message: impl Into<String>, index: usize) -> SymbolParseError {
        SymbolParseError::new(message, self.uri, index)
    }

    fn at_end(&self) -> bool {
        self.index >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.index).copied()
    }

    fn expect(&mut self, expected: u8) -> ParseResult<()> {
        match self.peek() {
            Some(b) if b == expected => {
                self.index += 1;
                Ok(())
            }
            Some(_) => Err(self.error(format!(
                "invalid character, expected '{}'",
                expected as char
            ))),
            None => Err(self.error(format!(
                "unexpected end of input, expected '{}'",
                expected as char
            ))),
        }
    }

    /// Reads up to a single space, which is consumed. A doubled space is a
    /// literal space. With `required_separator == false` the token may also
    /// end at end of input.
    fn accept_space_escaped(&mut self, what: &str, required_separator: bool) -> ParseResult<String> {
        let start = self.index;
        let mut value = String::new();
        let mut run_start = self.index;
        self.separated = false;

        loop {
            match self.peek() {
                Some(b' ') => {
                    if self.bytes.get(self.index + 1) == Some(&b' ') {
                        value.push_str(&self.uri[run_start..self.index]);
                        value.push(' ');
                        self.index += 2;
                        run_start = self.index;
                    } else {
                        value.push_str(&self.uri[run_start..self.index]);
                        self.index += 1;
                        self.separated = true;
                        break;
                    }
                }
                Some(_) => self.index += 1,
                None => {
                    if required_separator {
                        return Err(self.error(format!(
                            "unexpected end of input, expected a space after the {what}"
                        )));
                    }
                    value.push_str(&self.uri[run_start..self.index]);
                    break;
                }
            }
        }

        if value.is_empty() {
            return Err(self.error_at(format!("expected a {what}"), start));
        }
        Ok(value)
    }

    fn accept_package_field(&mut self, what: &str, required_separator: bool) -> ParseResult<String> {
        let value = self.accept_space_escaped(what, required_separator)?;
        if value == ABSENT {
            Ok(String::new())
        } else {
            Ok(value)
        }
    }

    fn accept_descriptor(&mut self) -> ParseResult<Descriptor> {
        match self.peek() {
            Some(b'(') => {
                self.index += 1;
                let name = self.accept_identifier("parameter name")?;
                self.expect(b')')?;
                Ok(Descriptor::new(name, Suffix::Parameter))
            }
            Some(b'[') => {
                self.index += 1;
                let name = self.accept_identifier("type parameter name")?;
                self.expect(b']')?;
                Ok(Descriptor::new(name, Suffix::TypeParameter))
            }
            _ => {
                let name = self.accept_identifier("descriptor name")?;
                let suffix_at = self.index;
                let suffix = match self.peek() {
                    Some(b'/') => Suffix::Namespace,
                    Some(b'#') => Suffix::Type,
                    Some(b'.') => Suffix::Term,
                    Some(b':') => Suffix::Meta,
                    Some(b'!') => Suffix::Macro,
                    Some(b'(') => {
                        self.index += 1;
                        let disambiguator_at = self.index;
                        let disambiguator = if self.peek() == Some(b')') {
                            String::new()
                        } else {
                            self.accept_identifier("method disambiguator")?
                        };
                        if disambiguator.is_empty() && self.index != disambiguator_at {
                            return Err(self.error_at(
                                "empty method disambiguator is written '()', not '(``)'",
                                disambiguator_at,
                            ));
                        }
                        self.expect(b')')?;
                        self.expect(b'.')?;
                        return Ok(Descriptor::method(name, disambiguator));
                    }
                    Some(_) => {
                        return Err(self.error_at("invalid descriptor suffix", suffix_at));
                    }
                    None => {
                        return Err(self.error("unexpected end of input, expected a descriptor suffix"));
                    }
                };
                self.index += 1;
                Ok(Descriptor::new(name, suffix))
            }
        }
    }

    fn accept_identifier(&mut self, what: &str) -> ParseResult<String> {
        if self.peek() == Some(b'`') {
            return self.accept_escaped_identifier();
        }

        let start = self.index;
        while self.peek().is_some_and(is_simple_byte) {
            self.index += 1;
        }

        if self.index == start {
            return Err(if self.at_end() {
                self.error(format!("unexpected end of input, expected a {what}"))
            } else {
                self.error(format!("invalid character, expected a {what}"))
            });
        }
        Ok(self.uri[start..self.index].to_string())
    }

    fn accept_escaped_identifier(&mut self) -> ParseResult<String> {
        let open = self.index;
        self.index += 1;
        let mut value = String::new();
        let mut run_start = self.index;

        loop {
            match self.peek() {
                Some(b'`') => {
                    value.push_str(&self.uri[run_start..self.index]);
                    if self.bytes.get(self.index + 1) == Some(&b'`') {
                        value.push('`');
                        self.index += 2;
                        run_start = self.index;
                    } else {
                        self.index += 1;
                        break;
                    }
                }
                Some(_) => self.index += 1,
                None => {
                    return Err(self.error_at("unterminated backtick escape", open));
                }
            }
        }

        if is_simple_identifier(&value) {
            return Err(self.error_at("redundant backtick escape around a simple identifier", open));
        }
        Ok(value)
    }
}
