use crate::error::{Result, RillError};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A scope frame: a mutable name → value mapping plus a link to the
/// enclosing frame, fixed at creation.  The global frame has no parent.
///
/// Frames are shared by reference (`Rc<RefCell<_>>`): a block and any call
/// frames chained from it hold the same live frame, and a frame stays alive
/// as long as any holder does.
#[derive(Debug, Clone, Default)]
pub struct Environment<'a> {
    values: HashMap<&'a str, Value<'a>>,
    enclosing: Option<Rc<RefCell<Environment<'a>>>>,
}

impl<'a> Environment<'a> {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment<'a>>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Bind `name` in this frame, shadowing any outer binding.
    pub fn define(&mut self, name: &'a str, value: Value<'a>) {
        self.values.insert(name, value);
    }

    /// Dynamic lookup through the chain.  Used for the global frame (which
    /// has no chain) and never for resolved locals.
    pub fn get(&self, name: &str, line: usize) -> Result<Value<'a>> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(RillError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    /// Dynamic assignment through the chain; the name must already exist.
    pub fn assign(&mut self, name: &'a str, value: Value<'a>, line: usize) -> Result<()> {
        if self.values.contains_key(name) {
            self.values.insert(name, value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(RillError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    /// Read `name` from the frame exactly `distance` hops up the chain.
    pub fn get_at(
        this: &Rc<RefCell<Environment<'a>>>,
        distance: usize,
        name: &str,
        line: usize,
    ) -> Result<Value<'a>> {
        let frame = Self::ancestor(this, distance);
        let borrowed = frame.borrow();

        match borrowed.values.get(name) {
            Some(value) => Ok(value.clone()),
            None => Err(RillError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            )),
        }
    }

    /// Store `name` into the frame exactly `distance` hops up the chain,
    /// creating the binding there if it is somehow absent.
    pub fn assign_at(
        this: &Rc<RefCell<Environment<'a>>>,
        distance: usize,
        name: &'a str,
        value: Value<'a>,
    ) {
        let frame = Self::ancestor(this, distance);
        frame.borrow_mut().values.insert(name, value);
    }

    /// Walk `distance` parent links.  Resolver distances never exceed the
    /// chain, so running out of parents stops at the outermost frame.
    fn ancestor(
        this: &Rc<RefCell<Environment<'a>>>,
        distance: usize,
    ) -> Rc<RefCell<Environment<'a>>> {
        let mut frame = Rc::clone(this);

        for _ in 0..distance {
            let parent = frame.borrow().enclosing.as_ref().map(Rc::clone);

            match parent {
                Some(p) => frame = p,
                None => break,
            }
        }

        frame
    }
}
