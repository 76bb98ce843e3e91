mod ast;
mod walk;

pub use ast::*;
pub use walk::{
    check_invariants, find_node, find_parent, find_pattern, map_children, max_node_id,
    parent_map, rename_variable_uses, replace_node, replace_pattern, with_fresh_ids,
};
