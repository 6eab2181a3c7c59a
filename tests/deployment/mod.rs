mod deployer;
mod lifecycle;
