pub mod openai_adapter;
