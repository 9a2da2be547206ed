//! Straightforward tree-walking evaluator used as a reference in tests.
//!
//! It shares no code with the compiler: it reads characters directly and
//! evaluates while parsing.

/// Evaluate `text`. `Err` carries a short reason; division by zero anywhere
/// in the expression is reported as `Err("division by zero")`.
pub fn reference_eval(text: &str) -> Result<f64, String> {
    let chars: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    let mut eval = Eval {
        chars: &chars,
        pos: 0,
        div_by_zero: false,
    };
    let value = eval.expr()?;
    if eval.pos != chars.len() {
        return Err(format!("trailing input at {}", eval.pos));
    }
    if eval.div_by_zero {
        return Err("division by zero".to_string());
    }
    Ok(value)
}

struct Eval<'a> {
    chars: &'a [char],
    pos: usize,
    div_by_zero: bool,
}

impl Eval<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn expr(&mut self) -> Result<f64, String> {
        let mut acc = self.term()?;
        while let Some(c @ ('+' | '-')) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            acc = if c == '+' { acc + rhs } else { acc - rhs };
        }
        Ok(acc)
    }

    fn term(&mut self) -> Result<f64, String> {
        let mut acc = self.factor()?;
        while let Some(c @ ('*' | '/')) = self.peek() {
            self.pos += 1;
            let rhs = self.factor()?;
            if c == '*' {
                acc *= rhs;
            } else {
                if rhs == 0.0 {
                    self.div_by_zero = true;
                }
                acc /= rhs;
            }
        }
        Ok(acc)
    }

    fn factor(&mut self) -> Result<f64, String> {
        match self.peek() {
            Some('-') => {
                self.pos += 1;
                Ok(-self.factor()?)
            }
            Some('(') => {
                self.pos += 1;
                let inner = self.expr()?;
                if self.peek() != Some(')') {
                    return Err(format!("expected ')' at {}", self.pos));
                }
                self.pos += 1;
                Ok(inner)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => {
                let start = self.pos;
                while self
                    .peek()
                    .is_some_and(|c| c.is_ascii_digit() || c == '.')
                {
                    self.pos += 1;
                }
                let literal: String = self.chars[start..self.pos].iter().collect();
                literal
                    .parse()
                    .map_err(|_| format!("bad number {literal:?}"))
            }
            other => Err(format!("unexpected {other:?} at {}", self.pos)),
        }
    }
}
