/// Binary operators as they appear in JavaScript/TypeScript source.
///
/// tree-sitter models logical (`&&`, `||`, `??`) and bitwise operators with
/// the same `binary_expression` node, so a single closed enum covers both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Exp,
    Shl,
    Shr,
    UShr,
    BitAnd,
    BitOr,
    BitXor,
    And,
    Or,
    Nullish,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    In,
    InstanceOf,
}

impl BinaryOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "%" => Self::Rem,
            "**" => Self::Exp,
            "<<" => Self::Shl,
            ">>" => Self::Shr,
            ">>>" => Self::UShr,
            "&" => Self::BitAnd,
            "|" => Self::BitOr,
            "^" => Self::BitXor,
            "&&" => Self::And,
            "||" => Self::Or,
            "??" => Self::Nullish,
            "<" => Self::Lt,
            "<=" => Self::LtEq,
            ">" => Self::Gt,
            ">=" => Self::GtEq,
            "==" => Self::Eq,
            "!=" => Self::NotEq,
            "===" => Self::StrictEq,
            "!==" => Self::StrictNotEq,
            "in" => Self::In,
            "instanceof" => Self::InstanceOf,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Exp => "**",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::UShr => ">>>",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::And => "&&",
            Self::Or => "||",
            Self::Nullish => "??",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::StrictEq => "===",
            Self::StrictNotEq => "!==",
            Self::In => "in",
            Self::InstanceOf => "instanceof",
        }
    }

    /// `<`, `<=`, `>`, `>=`
    pub fn is_ordering(self) -> bool {
        matches!(self, Self::Lt | Self::LtEq | Self::Gt | Self::GtEq)
    }

    pub fn is_equality(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::NotEq | Self::StrictEq | Self::StrictNotEq
        )
    }

    pub fn is_comparison(self) -> bool {
        self.is_ordering() || self.is_equality()
    }

    pub fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or | Self::Nullish)
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Rem
        )
    }

    /// Binding strength, higher binds tighter. `??` shares a level with `||`
    /// but may not be mixed with `&&`/`||` without parentheses.
    pub fn precedence(self) -> u8 {
        match self {
            Self::Or | Self::Nullish => 2,
            Self::And => 3,
            Self::BitOr => 4,
            Self::BitXor => 5,
            Self::BitAnd => 6,
            Self::Eq | Self::NotEq | Self::StrictEq | Self::StrictNotEq => 7,
            Self::Lt | Self::LtEq | Self::Gt | Self::GtEq | Self::In | Self::InstanceOf => 8,
            Self::Shl | Self::Shr | Self::UShr => 9,
            Self::Add | Self::Sub => 10,
            Self::Mul | Self::Div | Self::Rem => 11,
            Self::Exp => 12,
        }
    }
}

/// Boundary inclusion: `<` ↔ `<=`, `>` ↔ `>=`.
pub fn flip_boundary(op: BinaryOp) -> Option<BinaryOp> {
    match op {
        BinaryOp::Lt => Some(BinaryOp::LtEq),
        BinaryOp::LtEq => Some(BinaryOp::Lt),
        BinaryOp::Gt => Some(BinaryOp::GtEq),
        BinaryOp::GtEq => Some(BinaryOp::Gt),
        _ => None,
    }
}

/// Comparison direction: `<` ↔ `>`, `<=` ↔ `>=`.
pub fn flip_direction(op: BinaryOp) -> Option<BinaryOp> {
    match op {
        BinaryOp::Lt => Some(BinaryOp::Gt),
        BinaryOp::Gt => Some(BinaryOp::Lt),
        BinaryOp::LtEq => Some(BinaryOp::GtEq),
        BinaryOp::GtEq => Some(BinaryOp::LtEq),
        _ => None,
    }
}

/// Loose operators come back strict, so this table is not an involution.
pub fn flip_equality(op: BinaryOp) -> Option<BinaryOp> {
    match op {
        BinaryOp::Eq => Some(BinaryOp::StrictNotEq),
        BinaryOp::NotEq => Some(BinaryOp::StrictEq),
        BinaryOp::StrictEq => Some(BinaryOp::StrictNotEq),
        BinaryOp::StrictNotEq => Some(BinaryOp::StrictEq),
        _ => None,
    }
}

pub fn swap_and_or(op: BinaryOp) -> Option<BinaryOp> {
    match op {
        BinaryOp::And => Some(BinaryOp::Or),
        BinaryOp::Or => Some(BinaryOp::And),
        _ => None,
    }
}

/// `+` ↔ `-`, `*` ↔ `/`, and the one-way `%` → `/`.
pub fn swap_arithmetic(op: BinaryOp) -> Option<BinaryOp> {
    match op {
        BinaryOp::Add => Some(BinaryOp::Sub),
        BinaryOp::Sub => Some(BinaryOp::Add),
        BinaryOp::Mul => Some(BinaryOp::Div),
        BinaryOp::Div => Some(BinaryOp::Mul),
        BinaryOp::Rem => Some(BinaryOp::Div),
        _ => None,
    }
}

pub fn swap_bitwise_logical(op: BinaryOp) -> Option<BinaryOp> {
    match op {
        BinaryOp::And => Some(BinaryOp::BitAnd),
        BinaryOp::BitAnd => Some(BinaryOp::And),
        BinaryOp::Or => Some(BinaryOp::BitOr),
        BinaryOp::BitOr => Some(BinaryOp::Or),
        _ => None,
    }
}

/// Whether an unparenthesized `child` operand must be wrapped to keep its
/// grouping under `parent`.
pub fn needs_parens(child: BinaryOp, parent: BinaryOp, is_right: bool) -> bool {
    let mixes_nullish = (child == BinaryOp::Nullish
        && matches!(parent, BinaryOp::And | BinaryOp::Or))
        || (parent == BinaryOp::Nullish && matches!(child, BinaryOp::And | BinaryOp::Or));
    if mixes_nullish {
        return true;
    }

    let (inner, outer) = (child.precedence(), parent.precedence());
    if inner != outer {
        return inner < outer;
    }

    // `**` is right-associative
    if parent == BinaryOp::Exp {
        !is_right
    } else {
        is_right
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_SYMBOLS: [&str; 25] = [
        "+", "-", "*", "/", "%", "**", "<<", ">>", ">>>", "&", "|", "^", "&&", "||", "??", "<",
        "<=", ">", ">=", "==", "!=", "===", "!==", "in", "instanceof",
    ];

    #[test]
    fn test_symbols_round_trip() {
        for symbol in ALL_SYMBOLS {
            let op = BinaryOp::from_symbol(symbol).unwrap();
            assert_eq!(op.as_str(), symbol);
        }
        assert_eq!(BinaryOp::from_symbol("=>"), None);
    }

    #[test]
    fn test_boundary_and_direction_tables_are_involutions() {
        for op in [BinaryOp::Lt, BinaryOp::LtEq, BinaryOp::Gt, BinaryOp::GtEq] {
            assert_eq!(flip_boundary(flip_boundary(op).unwrap()), Some(op));
            assert_eq!(flip_direction(flip_direction(op).unwrap()), Some(op));
        }
        assert_eq!(flip_boundary(BinaryOp::Lt), Some(BinaryOp::LtEq));
        assert_eq!(flip_direction(BinaryOp::LtEq), Some(BinaryOp::GtEq));
        assert_eq!(flip_boundary(BinaryOp::StrictEq), None);
    }

    #[test]
    fn test_equality_table_is_asymmetric() {
        assert_eq!(flip_equality(BinaryOp::Eq), Some(BinaryOp::StrictNotEq));
        assert_eq!(flip_equality(BinaryOp::NotEq), Some(BinaryOp::StrictEq));
        assert_eq!(flip_equality(BinaryOp::StrictEq), Some(BinaryOp::StrictNotEq));
        assert_eq!(flip_equality(BinaryOp::StrictNotEq), Some(BinaryOp::StrictEq));

        // `==` does not come back
        let twice = flip_equality(flip_equality(BinaryOp::Eq).unwrap()).unwrap();
        assert_eq!(twice, BinaryOp::StrictEq);
    }

    #[test]
    fn test_arithmetic_remainder_is_one_way() {
        assert_eq!(swap_arithmetic(BinaryOp::Rem), Some(BinaryOp::Div));
        assert_eq!(swap_arithmetic(BinaryOp::Div), Some(BinaryOp::Mul));
        assert_eq!(swap_arithmetic(BinaryOp::Add), Some(BinaryOp::Sub));
        assert_eq!(swap_arithmetic(BinaryOp::Exp), None);
    }

    #[test]
    fn test_bitwise_logical_pairs() {
        assert_eq!(swap_bitwise_logical(BinaryOp::And), Some(BinaryOp::BitAnd));
        assert_eq!(swap_bitwise_logical(BinaryOp::BitOr), Some(BinaryOp::Or));
        assert_eq!(swap_bitwise_logical(BinaryOp::Nullish), None);
        assert_eq!(swap_and_or(BinaryOp::Nullish), None);
    }

    #[test]
    fn test_needs_parens() {
        // (a && b) | c
        assert!(needs_parens(BinaryOp::And, BinaryOp::BitOr, false));
        // a | b & c keeps grouping
        assert!(!needs_parens(BinaryOp::BitAnd, BinaryOp::BitOr, true));
        // a - (b + c)
        assert!(needs_parens(BinaryOp::Add, BinaryOp::Sub, true));
        assert!(!needs_parens(BinaryOp::Add, BinaryOp::Sub, false));
        // (a ** b) ** c
        assert!(needs_parens(BinaryOp::Exp, BinaryOp::Exp, false));
        assert!(!needs_parens(BinaryOp::Exp, BinaryOp::Exp, true));
        // a ?? (b && c)
        assert!(needs_parens(BinaryOp::And, BinaryOp::Nullish, true));
        assert!(needs_parens(BinaryOp::Nullish, BinaryOp::Or, false));
    }
}
