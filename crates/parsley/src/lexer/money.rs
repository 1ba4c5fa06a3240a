use std::str::FromStr;

use rust_decimal::Decimal;

use super::{Lexer, Mark};
use crate::syntax::{self, CURRENCY_SYMBOLS};
use crate::token::{Token, TokenKind};

impl<'a> Lexer<'a> {
    /// Byte length of a currency prefix at the cursor and the currency it names.
    ///
    /// Compound symbols and `CODE#` prefixes are tried before the one-character
    /// symbols, and only count when a number follows.
    pub(super) fn money_prefix(&self) -> Option<(usize, String)> {
        let rest = self.rest();
        for (symbol, code) in CURRENCY_SYMBOLS {
            if symbol.chars().count() > 1
                && rest.starts_with(symbol)
                && starts_amount(&rest[symbol.len()..])
            {
                return Some((symbol.len(), code.to_string()));
            }
        }
        let letters = rest
            .chars()
            .take_while(|c| c.is_ascii_uppercase())
            .count();
        if (2..=3).contains(&letters)
            && rest[letters..].starts_with('#')
            && starts_amount(&rest[letters + 1..])
        {
            return Some((letters + 1, rest[..letters].to_string()));
        }
        for (symbol, code) in CURRENCY_SYMBOLS {
            if symbol.chars().count() == 1 && rest.starts_with(symbol) {
                return Some((symbol.len(), code.to_string()));
            }
        }
        None
    }

    pub(super) fn scan_money(&mut self, start: Mark) -> Token {
        let Some((prefix_len, currency)) = self.money_prefix() else {
            return self.scan_operator(start);
        };
        self.bump_to(self.pos + prefix_len);
        let negative = self.current() == Some('-')
            && self.peek_char(1).is_some_and(|c| c.is_ascii_digit());
        if negative {
            self.bump();
        }
        if !self.current().is_some_and(|c| c.is_ascii_digit()) {
            return self.illegal(
                "E1004",
                format!(
                    "currency symbol '{}' must be followed by a number",
                    syntax::currency_display(&currency)
                ),
                start,
            );
        }
        let digits_start = self.pos;
        self.eat_digits();
        if self.current() == Some('.') && self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            self.eat_digits();
        }
        let number = &self.source[digits_start..self.pos];
        let literal_scale = number
            .split_once('.')
            .map_or(0, |(_, fraction)| fraction.len() as u32);
        let scale = match syntax::currency_scale(&currency) {
            Some(0) if literal_scale > 0 => {
                return self.illegal(
                    "E1004",
                    format!("{currency} does not allow decimal places (got {number})"),
                    start,
                );
            }
            Some(known) if literal_scale > known => {
                return self.illegal(
                    "E1004",
                    format!(
                        "{currency} allows max {known} decimal places (got {literal_scale} in {number})"
                    ),
                    start,
                );
            }
            Some(known) => known,
            None => syntax::DEFAULT_CURRENCY_SCALE.max(literal_scale),
        };
        let Ok(mut amount) = Decimal::from_str(number) else {
            return self.illegal(
                "E1004",
                format!("money amount {number} is out of range"),
                start,
            );
        };
        amount.rescale(scale);
        if negative && !amount.is_zero() {
            amount.set_sign_negative(true);
        }
        self.token(TokenKind::Money, format!("{currency}#{amount}"), start)
    }
}

fn starts_amount(rest: &str) -> bool {
    let mut chars = rest.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('-') => chars.next().is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    }
}
