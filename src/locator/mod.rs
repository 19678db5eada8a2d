pub mod resolver;
pub mod strategies;

pub use resolver::{ElementResolver, ResolvedElement, Resolution, ResolverState};
pub use strategies::{
    AttributePredicateStrategy, IdentifierSubstringStrategy, KeywordTextStrategy, StrategySet,
    TagOnlyStrategy,
};
