//! Compilation of a condition tree into a parameterized WHERE fragment
//!
//! The compiler only emits text and collects values; binding the values is
//! left to the executing data layer. Field names are emitted as they are,
//! so callers must validate them against their schema first (see
//! [`Condition::fields`]).

use super::{Combinator, Condition, LeafOperator, Node, Predicate, Value};

/// Bind placeholder convention of the target driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placeholder {
    /// Positional `?` (SQLite, MySQL)
    #[default]
    Question,
    /// Numbered `$1`, `$2`, ... (PostgreSQL)
    Numbered,
}

/// How `ILIKE` leaves are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IlikeSupport {
    /// The store understands `ILIKE`
    #[default]
    Native,
    /// Emulate with `LOWER(field) LIKE LOWER(?)`
    Lower,
}

/// Executor-chosen rendering options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompileOptions {
    /// Placeholder convention
    pub placeholder: Placeholder,
    /// `ILIKE` rendering
    pub ilike: IlikeSupport,
}

impl CompileOptions {
    /// Options with the given placeholder style and native `ILIKE`
    #[must_use]
    pub const fn new(placeholder: Placeholder) -> Self {
        Self {
            placeholder,
            ilike: IlikeSupport::Native,
        }
    }

    /// Set the `ILIKE` rendering
    #[must_use]
    pub const fn with_ilike(mut self, ilike: IlikeSupport) -> Self {
        self.ilike = ilike;
        self
    }
}

/// WHERE fragment plus the values to bind, in placeholder order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledWhere {
    /// Boolean expression without the `WHERE` keyword; empty for an empty tree
    pub text: String,
    /// One value per placeholder in `text`, left to right
    pub params: Vec<Value>,
}

impl CompiledWhere {
    /// True when there is nothing to filter on
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// ` WHERE <text>` or an empty string, ready to append to a statement
    #[must_use]
    pub fn where_clause(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.text)
        }
    }
}

impl Condition {
    /// Compile with `?` placeholders and native `ILIKE`
    ///
    /// # Example
    ///
    /// ```rust
    /// use book_service::condition::{Condition, Value};
    ///
    /// let compiled = Condition::new().like("title", "harry potter").compile();
    /// assert_eq!(compiled.text, "title LIKE ?");
    /// assert_eq!(compiled.params, vec![Value::from("%harry potter%")]);
    /// ```
    #[must_use]
    pub fn compile(&self) -> CompiledWhere {
        self.compile_with(CompileOptions::default())
    }

    /// Compile with executor-specific options
    ///
    /// # Example
    ///
    /// ```rust
    /// use book_service::condition::{CompileOptions, Condition, Placeholder};
    ///
    /// let compiled = Condition::new()
    ///     .equal("author", "Herge")
    ///     .like("title", "Tintin")
    ///     .compile_with(CompileOptions::new(Placeholder::Numbered));
    /// assert_eq!(compiled.text, "author = $1 AND title LIKE $2");
    /// ```
    #[must_use]
    pub fn compile_with(&self, options: CompileOptions) -> CompiledWhere {
        let mut compiler = Compiler {
            options,
            params: Vec::new(),
        };
        let text = compiler.join(self);
        CompiledWhere {
            text,
            params: compiler.params,
        }
    }
}

struct Compiler {
    options: CompileOptions,
    params: Vec<Value>,
}

impl Compiler {
    /// Entries of `condition` joined by its operator, without outer parentheses
    fn join(&mut self, condition: &Condition) -> String {
        if condition.operator == Combinator::Not {
            return self.negate(condition);
        }
        let separator = match condition.operator {
            Combinator::Or => " OR ",
            _ => " AND ",
        };

        let mut text = String::new();
        for entry in &condition.entries {
            let fragment = self.entry(entry);
            // empty groups vanish together with their separator
            if fragment.is_empty() {
                continue;
            }
            if !text.is_empty() {
                text.push_str(separator);
            }
            text.push_str(&fragment);
        }
        text
    }

    fn entry(&mut self, node: &Node) -> String {
        match node {
            Node::Leaf(predicate) => self.leaf(predicate),
            Node::Group(group) if group.operator == Combinator::Not => self.negate(group),
            Node::Group(group) => {
                let inner = self.join(group);
                if inner.is_empty() {
                    inner
                } else {
                    format!("({inner})")
                }
            }
        }
    }

    fn negate(&mut self, group: &Condition) -> String {
        let inner = match group.entries.first() {
            Some(Node::Group(child)) if child.operator != Combinator::Not => self.join(child),
            Some(node) => self.entry(node),
            None => String::new(),
        };
        if inner.is_empty() {
            inner
        } else {
            format!("NOT ({inner})")
        }
    }

    fn leaf(&mut self, predicate: &Predicate) -> String {
        self.params.push(predicate.value.clone());
        let placeholder = match self.options.placeholder {
            Placeholder::Question => "?".to_string(),
            Placeholder::Numbered => format!("${}", self.params.len()),
        };

        match (predicate.operator, self.options.ilike) {
            (LeafOperator::ILike, IlikeSupport::Lower) => {
                format!("LOWER({}) LIKE LOWER({placeholder})", predicate.field)
            }
            (operator, _) => format!("{} {operator} {placeholder}", predicate.field),
        }
    }
}
