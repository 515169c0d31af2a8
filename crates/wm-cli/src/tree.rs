//! Console tree rendering.

use std::fmt;

const BRANCH: &str = "├── ";
const CORNER: &str = "└── ";
const PIPE_GAP: &str = "│   ";
const SPACE: &str = "    ";

/// A labelled node with ordered children.
#[derive(Debug, Default)]
pub struct Node {
    label: String,
    children: Vec<Self>,
}

impl Node {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
        }
    }

    pub fn push(&mut self, child: Self) {
        self.children.push(child);
    }
}

impl fmt::Display for Node {
    /// Writes the root label, then every descendant. Each line ends in a newline.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_children(
            node: &Node,
            f: &mut fmt::Formatter<'_>,
            prefix: &mut String,
        ) -> fmt::Result {
            for (i, child) in node.children.iter().enumerate() {
                let is_last = i + 1 == node.children.len();
                let (head, tail) = if is_last {
                    (CORNER, SPACE)
                } else {
                    (BRANCH, PIPE_GAP)
                };
                writeln!(f, "{prefix}{head}{}", child.label)?;
                prefix.push_str(tail);
                write_children(child, f, prefix)?;
                prefix.truncate(prefix.len() - tail.len());
            }
            Ok(())
        }

        writeln!(f, "{}", self.label)?;
        write_children(self, f, &mut String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_nested_children() {
        let mut root = Node::new("root");
        let mut a = Node::new("a");
        a.push(Node::new("a1"));
        a.push(Node::new("a2"));
        root.push(a);
        let mut b = Node::new("b");
        b.push(Node::new("b1"));
        root.push(b);

        let expected = "root\n├── a\n│   ├── a1\n│   └── a2\n└── b\n    └── b1\n";
        assert_eq!(root.to_string(), expected);
    }

    #[test]
    fn lone_root_is_one_line() {
        let root = Node::new("only");
        assert_eq!(root.to_string(), "only\n");
    }
}
