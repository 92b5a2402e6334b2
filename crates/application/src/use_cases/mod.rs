mod answer_table;

pub use answer_table::AnswerTable;
