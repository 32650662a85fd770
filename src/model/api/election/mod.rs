mod desc;

pub use desc::EligibleElectionView;
