pub(crate) mod canvas;
pub(crate) mod damage;
pub(crate) mod history;
