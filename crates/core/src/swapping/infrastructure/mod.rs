pub mod inswapper;
